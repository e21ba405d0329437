use anyhow::{Context, Result};
use codecov_config::UploaderConfig;
use codecov_ports::{HttpRequest, HttpResponse, Method, Transport};
use log::debug;
use reqwest::blocking::Client;
use url::Url;

/// `Transport` over a blocking reqwest client with bounded timeouts.
///
/// Only the headers carried by each [`HttpRequest`] are sent; the client adds
/// no `User-Agent` of its own.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &UploaderConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .context("build reqwest client")?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// The request URL with its query parameters appended in order.
pub fn request_url(request: &HttpRequest) -> Result<Url> {
    let url = if request.query.is_empty() {
        Url::parse(&request.url)
    } else {
        Url::parse_with_params(&request.url, &request.query)
    };
    url.with_context(|| format!("invalid request URL {}", request.url))
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request_url(request)?;
        let method = request.method.as_str();

        let mut req = match request.method {
            Method::Post => self.client.post(url.clone()),
            Method::Put => self.client.put(url.clone()),
        };
        for (name, value) in &request.headers {
            // reqwest derives Content-Length from the body
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            req = req.header(name.as_str(), value.as_str());
        }
        let req = req.body(request.body.clone());

        debug!("{method} {} ({} byte body)", url.path(), request.body.len());
        // the query string carries the upload token; keep it out of errors
        let resp = req
            .send()
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("{method} {}", request.url))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .with_context(|| format!("read response body from {}", request.url))?;
        Ok(HttpResponse { status, body })
    }
}
