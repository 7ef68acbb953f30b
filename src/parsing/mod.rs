pub mod html_to_document;
