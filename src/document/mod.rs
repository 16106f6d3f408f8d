pub mod accessor;
pub mod io;
pub mod model;

pub use accessor::DEFAULT_RESPONSE_DESCRIPTION;
pub use io::{
    fixed_sibling_path, load_from_path, parse_str, to_string, write_atomic, DocumentError, Format,
    LoadedDocument,
};
pub use model::{
    Components, Document, Operation, Parameter, PathItem, Paths, RequestBody, Response, Schema,
    Server, HTTP_METHODS,
};
