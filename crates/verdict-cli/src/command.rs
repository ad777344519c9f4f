use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde_json::Value;
use tracing::info;
use verdict_client::GraphQLClient;
use verdict_core::{extract, ExtractError, Extracted, Outcome};

use crate::configuration::{parse_header, Configuration, Overrides};
use crate::Error;

#[derive(Args, Clone, Debug)]
pub struct ConnectionParameters {
    /// JSON configuration file.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(long, global = true)]
    pub endpoint: Option<String>,

    /// Request header as `name=value`, repeatable.
    #[clap(long = "header", global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds.
    #[clap(long, global = true)]
    pub timeout: Option<u64>,
}

impl ConnectionParameters {
    /// File, then environment, then flags.
    pub fn configuration(&self) -> Result<Configuration, Error> {
        let configuration = match &self.config {
            Some(path) => Configuration::from_file(path)?,
            None => Configuration::default(),
        };

        Ok(configuration.with_environment()?.with_overrides(Overrides {
            endpoint: self.endpoint.clone(),
            headers: self.headers.clone(),
            timeout: self.timeout,
        }))
    }
}

type Extractor = Box<dyn FnOnce(&Value) -> Result<Extracted<Value>, ExtractError> + Send>;

#[derive(Args, Clone, Debug)]
pub struct RequestParameters {
    /// File holding the GraphQL document.
    #[clap(long)]
    pub document: PathBuf,

    /// Variables as a JSON object.
    #[clap(long, default_value = "{}")]
    pub variables: String,

    /// JSON pointer into `data` selecting the value to print, the whole `data` when absent.
    #[clap(long)]
    pub pointer: Option<String>,
}

impl RequestParameters {
    fn document(&self) -> Result<String, Error> {
        fs::read_to_string(&self.document).map_err(|e| Error::Validation(format!("{}: {}", self.document.display(), e)))
    }

    fn variables(&self) -> Result<Value, Error> {
        let variables: Value = serde_json::from_str(&self.variables).map_err(|e| Error::Validation(format!("invalid variables: {}", e)))?;
        if !variables.is_object() {
            return Err(Error::Validation("variables must be a JSON object".to_string()));
        }

        Ok(variables)
    }

    fn extractor(&self) -> Result<Extractor, Error> {
        let extractor: Extractor = match &self.pointer {
            Some(pointer) if !pointer.is_empty() && !pointer.starts_with('/') => {
                return Err(Error::Validation(format!("invalid pointer {}, must be empty or start with '/'", pointer)));
            },
            Some(pointer) => Box::new(extract::at::<Value>(pointer.clone())),
            None => Box::new(|data: &Value| Ok(Extracted::Found(data.clone()))),
        };

        Ok(extractor)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Operation {
    Query,
    Mutation,
}

pub async fn command_request(operation: Operation, request: RequestParameters, client: &GraphQLClient) -> Result<Outcome<Value>, Error> {
    let document = request.document()?;
    let variables = request.variables()?;
    let extract = request.extractor()?;

    info!(operation = ?operation, document = %request.document.display(), "sending request");

    let outcome = match operation {
        Operation::Query => client.query(&document, variables, extract).await,
        Operation::Mutation => client.mutate(&document, variables, extract).await,
    };

    Ok(outcome)
}
