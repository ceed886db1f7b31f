use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use reqwest::blocking::{multipart, Client};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use std::path::Path;
use std::sync::OnceLock;

use super::{Fetched, SearchSession, UploadReply};
use crate::error::{Error, Result};

/// Live session: reqwest for uploads and downloads, headless Chrome for
/// pages whose results are filled in by client-side script.
pub struct WebSession {
    /// Never follows redirects, so the upload's `Location` stays readable
    uploader: Client,
    client: Client,
    browser: OnceLock<Browser>,
}

impl WebSession {
    pub fn new(user_agent: &str) -> Result<Self> {
        let uploader = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .build()?;
        let client = Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            uploader,
            client,
            browser: OnceLock::new(),
        })
    }

    /// The browser is only launched once a page actually needs rendering
    fn browser(&self) -> Result<&Browser> {
        if let Some(browser) = self.browser.get() {
            return Ok(browser);
        }

        debug!("Launching headless browser");
        let browser = Browser::new(LaunchOptions {
            headless: true,
            ..Default::default()
        })
        .map_err(|e| Error::Render(format!("failed to launch browser: {}", e)))?;

        Ok(self.browser.get_or_init(|| browser))
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_connect() || err.is_timeout() {
        Error::Connection(err.to_string())
    } else {
        Error::Http(err)
    }
}

impl SearchSession for WebSession {
    fn upload(&self, endpoint: &str, image: &Path) -> Result<UploadReply> {
        let form = multipart::Form::new()
            .file("encoded_image", image)?
            .text("image_content", "");

        let response = self
            .uploader
            .post(endpoint)
            .multipart(form)
            .send()
            .map_err(transport_error)?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(UploadReply {
            status: response.status().as_u16(),
            location,
        })
    }

    fn render(&self, url: &str) -> Result<String> {
        let tab = self
            .browser()?
            .new_tab()
            .map_err(|e| Error::Render(e.to_string()))?;

        let content = tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .and_then(|tab| tab.get_content())
            .map_err(|e| Error::Render(format!("{}: {}", url, e)));

        let _ = tab.close(true);
        content
    }

    fn fetch(&self, url: &str) -> Result<Fetched> {
        let response = self.client.get(url).send().map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(transport_error)?.to_vec();
        Ok(Fetched { status, body })
    }
}
