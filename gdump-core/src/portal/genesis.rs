use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Response, Url, header};
use serde::Serialize;

use crate::{
    Credentials, Error, Result, Session,
    config::PortalConfig,
    portal::{PortalClient, PortalClientBuilder, ScheduleSource, cookie_header, response_cookies},
    refine::SCHEDULE_DATE_FORMAT,
};

const SESSION_COOKIE: &str = "JSESSIONID";
const STUDENT_ID_PARAM: &str = "studentid";

#[derive(Serialize)]
struct LoginForm<'a> {
    #[serde(rename = "idTokenString")]
    id_token_string: &'a str,
    j_username: &'a str,
    j_password: &'a str,
}

/// Genesis student information system
pub struct GenesisPortal {
    base: PortalClient,
    base_url: String,
}

impl GenesisPortal {
    /// Client for the instance at `config.base_url`
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{base_url}': {e}")))?;

        let base = PortalClientBuilder::new("genesis")
            .timeout(config.timeout)
            .build()?;

        Ok(Self { base, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute target of a redirect response
    fn redirect_target(&self, response: &Response) -> Result<Url> {
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                self.base.custom_error(format!(
                    "expected a redirect from {}, got HTTP {}",
                    response.url(),
                    response.status()
                ))
            })?;

        response
            .url()
            .join(location)
            .map_err(|e| self.base.custom_error(format!("Invalid redirect '{location}': {e}")))
    }

    fn ensure_not_failed(&self, response: &Response) -> Result<()> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(self.base.custom_error(format!(
                "HTTP {} from {}",
                status,
                response.url().path()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleSource for GenesisPortal {
    fn name(&self) -> &str {
        &self.base.name
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        tracing::info!("Authenticating user: {}", credentials.username);

        let response = self
            .base
            .client
            .post(format!("{}/sis/j_security_check", self.base_url))
            .form(&LoginForm {
                id_token_string: "",
                j_username: &credentials.username,
                j_password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| self.base.handle_error_req(e))?;
        self.ensure_not_failed(&response)?;

        let cookies = response_cookies(response.headers());
        let session_id = cookies
            .iter()
            .find(|(name, _)| name == SESSION_COOKIE)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                Error::Authentication(
                    "Authentication failed. Please check your credentials.".to_string(),
                )
            })?;

        let landing = self.redirect_target(&response)?;
        let redirect = self
            .base
            .client
            .get(landing)
            .header(
                header::COOKIE,
                cookie_header(cookies.iter().map(|(n, v)| (n.as_str(), v.as_str()))),
            )
            .send()
            .await
            .map_err(|e| self.base.handle_error_req(e))?;
        self.ensure_not_failed(&redirect)?;

        let student_id = self
            .redirect_target(&redirect)?
            .query_pairs()
            .find(|(key, _)| key == STUDENT_ID_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::Authentication(
                    "Portal did not report a student id; pass it explicitly".to_string(),
                )
            })?;

        tracing::info!("Logged in as student {}", student_id);

        Ok(Session {
            session_id,
            student_id,
        })
    }

    async fn fetch_day(&self, session: &Session, date: NaiveDate) -> Result<String> {
        let schedule_date = date.format(SCHEDULE_DATE_FORMAT).to_string();

        let response = self
            .base
            .client
            .get(format!("{}/parents", self.base_url))
            .query(&[
                ("tab1", "studentdata"),
                ("tab2", "studentsummary"),
                ("action", "ajaxGetBellScheduleForDateJsp"),
                ("studentid", session.student_id.as_str()),
                ("scheduleDate", schedule_date.as_str()),
                ("schedView", "daily"),
                ("mpToView", ""),
            ])
            .header(
                header::COOKIE,
                cookie_header([(SESSION_COOKIE, session.session_id.as_str())]),
            )
            .send()
            .await
            .map_err(|e| self.base.handle_error_req(e))?;

        // Redirects are not followed, so an expired session lands here too
        if !response.status().is_success() {
            return Err(self.base.custom_error(format!(
                "HTTP {} fetching schedule for {}",
                response.status(),
                schedule_date
            )));
        }

        response.text().await.map_err(|e| self.base.handle_error_req(e))
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    use super::*;

    /// Serve `responses` to consecutive connections and hand back the raw requests
    async fn serve(responses: Vec<String>) -> (GenesisPortal, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/genesis", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let mut requests = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            requests
        });

        let portal = GenesisPortal::new(&PortalConfig {
            base_url,
            timeout: Some(5),
        })
        .unwrap();
        (portal, server)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let body_len = text[..head_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut response = format!("HTTP/1.1 {status}\r\n");
        for (name, value) in headers {
            write!(response, "{name}: {value}\r\n").unwrap();
        }
        write!(
            response,
            "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        response
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "student@example.org".to_string(),
            password: "secret".to_string(),
        }
    }

    fn session() -> Session {
        Session {
            session_id: "X".to_string(),
            student_id: "42".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_without_session_cookie_fails() {
        let (portal, server) = serve(vec![http_response(
            "302 Found",
            &[("Location", "/genesis/sis/view?gohome=true")],
            "",
        )])
        .await;

        let result = portal.authenticate(&credentials()).await;
        assert!(matches!(result, Err(Error::Authentication(_))));

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /genesis/sis/j_security_check "));
        assert!(requests[0].contains("j_username=student%40example.org"));
    }

    #[tokio::test]
    async fn test_login_reads_session_and_student_id() {
        let (portal, server) = serve(vec![
            http_response(
                "302 Found",
                &[
                    ("Set-Cookie", "JSESSIONID=X; Path=/genesis; HttpOnly"),
                    ("Location", "/x"),
                ],
                "",
            ),
            http_response(
                "302 Found",
                &[("Location", "/genesis/parents?foo=1&studentid=42")],
                "",
            ),
        ])
        .await;

        let logged_in = portal.authenticate(&credentials()).await.unwrap();
        assert_eq!(logged_in, session());

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].starts_with("GET /x "));
        assert!(requests[1].to_lowercase().contains("cookie: jsessionid=x"));
    }

    #[tokio::test]
    async fn test_login_without_student_id_fails() {
        let (portal, _server) = serve(vec![
            http_response(
                "302 Found",
                &[("Set-Cookie", "JSESSIONID=X"), ("Location", "/x")],
                "",
            ),
            http_response("302 Found", &[("Location", "/genesis/parents?foo=1")], ""),
        ])
        .await;

        let result = portal.authenticate(&credentials()).await;
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[tokio::test]
    async fn test_fetch_day_returns_page() {
        let body = "<table><tr><td class=\"cellCenter\">School Closed</td></tr></table>";
        let (portal, server) = serve(vec![http_response("200 OK", &[], body)]).await;

        let date = NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
        let markup = portal.fetch_day(&session(), date).await.unwrap();
        assert_eq!(markup, body);

        let request = server.await.unwrap().remove(0).to_lowercase();
        assert!(request.starts_with("get /genesis/parents?"));
        assert!(request.contains("action=ajaxgetbellschedulefordatejsp"));
        assert!(request.contains("studentid=42"));
        assert!(request.contains("scheduledate=09%2f03%2f2024"));
        assert!(request.contains("cookie: jsessionid=x"));
    }

    #[tokio::test]
    async fn test_fetch_day_does_not_follow_redirects() {
        let (portal, server) = serve(vec![http_response(
            "302 Found",
            &[("Location", "/genesis/sis/view?gohome=true")],
            "",
        )])
        .await;

        let date = NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
        let result = portal.fetch_day(&session(), date).await;
        assert!(matches!(result, Err(Error::Portal(_))));
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let portal = GenesisPortal::new(&PortalConfig {
            base_url: "https://students.example.org/genesis/".to_string(),
            timeout: Some(10),
        })
        .unwrap();
        assert_eq!(portal.base_url(), "https://students.example.org/genesis");
        assert_eq!(portal.name(), "genesis");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = GenesisPortal::new(&PortalConfig {
            base_url: "not a url".to_string(),
            timeout: None,
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_login_form_encoding() {
        let form = LoginForm {
            id_token_string: "",
            j_username: "student@example.org",
            j_password: "p&ss",
        };
        let encoded = encode_form(&form);
        assert!(encoded.contains("idTokenString="));
        assert!(encoded.contains("j_username=student%40example.org"));
        assert!(encoded.contains("j_password=p%26ss"));
    }

    fn encode_form(form: &LoginForm<'_>) -> String {
        let request = reqwest::Client::new()
            .post("https://example.org/login")
            .form(form)
            .build()
            .unwrap();
        String::from_utf8(request.body().unwrap().as_bytes().unwrap().to_vec()).unwrap()
    }
}
