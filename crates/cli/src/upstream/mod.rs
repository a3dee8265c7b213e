//! Upstream API schemas and endpoint definitions.

pub mod adoptium;
pub mod azul;
pub mod fabric;
pub mod neoforge;
pub mod piston;

use metagen_core::Error;
use url::Url;

pub fn parse_url(raw: &str) -> Result<Url, Error> {
    Url::parse(raw).map_err(|err| Error::Validation(format!("invalid URL '{raw}': {err}")))
}
