//! Small HTML fragments shared by the resolver and the connection worker.

use html_escape::{encode_single_quoted_attribute, encode_text};

/// A minimal page showing `message` as its title and heading.
///
/// Only ever called with status lines, never with internal error text.
pub fn error_page(message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <title>{message}</title>\n\
         <style>* {{font-family: Arial, Sans-Serif;}}</style>\n\
         </head>\n\
         <body>\n\
         <h1>{message}</h1>\n\
         </body>\n\
         </html>\n",
        message = encode_text(message)
    )
}

/// Body sent along with a 301 redirect.
pub fn redirect_stub(location: &str) -> String {
    format!(
        "Permanently moved <a href='{}'>here</a>.",
        encode_single_quoted_attribute(location)
    )
}
