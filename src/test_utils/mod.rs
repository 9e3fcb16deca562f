#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use form::{assert_selected_option, assert_text_input_with_value, must_get_form};
pub(crate) use html::{assert_valid_html, must_select_text, parse_html_document, select_hrefs};
pub(crate) use http::{assert_content_type, assert_status_ok, get_header};
