//! Printer test page

use chrono::{DateTime, Local};

/// Render the fixed-format test page for `printer`
pub fn test_page_content(printer: &str, now: DateTime<Local>) -> String {
    let test_id = format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros());
    format!(
        "=== PRINT TEST PAGE ===\n\
         \n\
         Printer: {printer}\n\
         Date: {date}\n\
         Test ID: {id}\n\
         \n\
         This is a test page printed from print-bridge.\n\
         \n\
         If you can see this page, the printer is working correctly.\n\
         \n\
         === END TEST PAGE ===",
        printer = printer,
        date = now.format("%Y-%m-%d %H:%M:%S"),
        id = test_id,
    )
}
