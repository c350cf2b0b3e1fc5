mod url_param;

pub use url_param::{APP_TOKEN_PARAM, UrlParam};
