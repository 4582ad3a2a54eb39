//! HTTP transport - reqwest implementation of the deposition API transport

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::traits::{ApiRequest, ApiResponse, DepositTransport, HttpMethod, RequestBody};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};

/// Bearer-authenticated reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
    token: SecretString,
}

impl HttpTransport {
    /// Build a client for the given configuration
    ///
    /// No timeout is set unless the configuration carries one.
    pub fn new(config: &PublisherConfig) -> Result<Self, PublishError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            PublishError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            token: SecretString::new(config.token().expose_secret().into()),
        })
    }

    fn build(&self, request: ApiRequest) -> reqwest::RequestBuilder {
        let builder = match request.method {
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
        }
        .bearer_auth(self.token.expose_secret());

        match request.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::File {
                field,
                file_name,
                contents,
            } => {
                let part = Part::bytes(contents).file_name(file_name);
                builder.multipart(Form::new().part(field, part))
            }
        }
    }
}

fn map_send_error(e: reqwest::Error) -> PublishError {
    if e.is_timeout() {
        PublishError::Timeout(e.to_string())
    } else {
        PublishError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl DepositTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, PublishError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");

        let response = self.build(request).send().await.map_err(map_send_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_send_error)?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Environment;
    use serde_json::json;

    fn transport() -> HttpTransport {
        let config = PublisherConfig::new(
            Environment::Sandbox,
            SecretString::new("test-token-1234567890".into()),
        );
        HttpTransport::new(&config).unwrap()
    }

    fn header(request: &reqwest::Request, name: reqwest::header::HeaderName) -> Option<String> {
        request
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_json_request_headers() {
        let request = transport()
            .build(ApiRequest {
                method: HttpMethod::Put,
                url: "https://sandbox.zenodo.org/api/deposit/depositions/1".to_string(),
                body: RequestBody::Json(json!({"metadata": {"title": "T"}})),
            })
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::PUT);
        assert_eq!(
            header(&request, reqwest::header::AUTHORIZATION).as_deref(),
            Some("Bearer test-token-1234567890")
        );
        assert_eq!(
            header(&request, CONTENT_TYPE).as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn test_empty_body_is_still_json_call() {
        let request = transport()
            .build(ApiRequest {
                method: HttpMethod::Post,
                url: "https://sandbox.zenodo.org/api/deposit/depositions/1/actions/publish"
                    .to_string(),
                body: RequestBody::Empty,
            })
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            header(&request, CONTENT_TYPE).as_deref(),
            Some("application/json")
        );
        assert!(request.body().is_none());
    }

    #[test]
    fn test_file_upload_is_multipart() {
        let request = transport()
            .build(ApiRequest {
                method: HttpMethod::Post,
                url: "https://sandbox.zenodo.org/api/deposit/depositions/1/files".to_string(),
                body: RequestBody::File {
                    field: "file".to_string(),
                    file_name: "paper.pdf".to_string(),
                    contents: b"%PDF-1.7".to_vec(),
                },
            })
            .build()
            .unwrap();

        let content_type = header(&request, CONTENT_TYPE).unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(
            header(&request, reqwest::header::AUTHORIZATION).as_deref(),
            Some("Bearer test-token-1234567890")
        );
    }

    #[test]
    fn test_timeout_from_config() {
        let config = PublisherConfig::new(
            Environment::Production,
            SecretString::new("test-token-1234567890".into()),
        )
        .with_timeout(std::time::Duration::from_secs(5));
        assert!(HttpTransport::new(&config).is_ok());
    }
}
