//! Share and download intents.
//!
//! Platform integrations implement [`ShareTarget`]. [`perform_share`] runs an
//! intent and turns the result into a short-lived [`Notice`]; failures never
//! escape to the caller.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::error::{GalleryError, Result};
use crate::models::ImageItem;

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAction {
    Download,
    Share,
}

/// How a share intent was fulfilled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareMethod {
    /// A system share sheet was shown.
    Sheet,
    /// No share sheet; the link was placed on the clipboard.
    CopiedLink(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub ttl: Duration,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            ttl: NOTICE_TTL,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            ttl: NOTICE_TTL,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

pub trait ShareTarget: Send + Sync {
    fn download(&self, uri: &str, name: &str) -> impl Future<Output = Result<PathBuf>> + Send;

    fn share(&self, uri: &str, name: &str) -> impl Future<Output = Result<ShareMethod>> + Send;
}

/// Runs `action` for `item` and reports the outcome as a notice.
pub async fn perform_share<T: ShareTarget>(
    target: &T,
    action: ShareAction,
    item: &ImageItem,
) -> Notice {
    match action {
        ShareAction::Download => match target.download(&item.uri, &item.name).await {
            Ok(path) => {
                info!(name = %item.name, path = %path.display(), "Downloaded item");
                Notice::success("File downloaded")
            }
            Err(e) => {
                warn!(name = %item.name, error = %e, "Download failed");
                Notice::error("Could not download file")
            }
        },
        ShareAction::Share => match target.share(&item.uri, &item.name).await {
            Ok(ShareMethod::Sheet) => Notice::success("Shared"),
            Ok(ShareMethod::CopiedLink(_)) => Notice::success("Link copied to clipboard"),
            Err(e) => {
                warn!(name = %item.name, error = %e, "Share failed");
                Notice::error("Could not share file")
            }
        },
    }
}

/// Desktop target: downloads into a directory, shares by handing back the link.
pub struct DirectoryTarget {
    http: reqwest::Client,
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>, config: &FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            dir: dir.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ShareTarget for DirectoryTarget {
    async fn download(&self, uri: &str, name: &str) -> Result<PathBuf> {
        let file_name = sanitize_file_name(name)
            .ok_or_else(|| GalleryError::Share(format!("unusable file name {name:?}")))?;

        let response = self.http.get(uri).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&body).await?;
        file.flush().await?;

        debug!(uri, bytes = body.len(), path = %path.display(), "Saved download");
        Ok(path)
    }

    async fn share(&self, uri: &str, _name: &str) -> Result<ShareMethod> {
        Ok(ShareMethod::CopiedLink(uri.to_string()))
    }
}

/// Keeps only the final path component and rejects names that would escape
/// the download directory.
fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    struct Scripted {
        fail: bool,
        sheet: bool,
    }

    impl ShareTarget for Scripted {
        async fn download(&self, _uri: &str, name: &str) -> Result<PathBuf> {
            if self.fail {
                Err(GalleryError::Status(404))
            } else {
                Ok(PathBuf::from(name))
            }
        }

        async fn share(&self, uri: &str, _name: &str) -> Result<ShareMethod> {
            match (self.fail, self.sheet) {
                (true, _) => Err(GalleryError::Share("no share sheet".into())),
                (false, true) => Ok(ShareMethod::Sheet),
                (false, false) => Ok(ShareMethod::CopiedLink(uri.to_string())),
            }
        }
    }

    fn item() -> ImageItem {
        ImageItem::new("a.png", "http://h/a.png")
    }

    #[tokio::test]
    async fn test_success_notices() {
        let target = Scripted {
            fail: false,
            sheet: false,
        };
        let notice = perform_share(&target, ShareAction::Download, &item()).await;
        assert_eq!(notice, Notice::success("File downloaded"));

        let notice = perform_share(&target, ShareAction::Share, &item()).await;
        assert_eq!(notice.message, "Link copied to clipboard");
    }

    #[tokio::test]
    async fn test_failures_become_error_notices() {
        let target = Scripted {
            fail: true,
            sheet: true,
        };
        assert!(perform_share(&target, ShareAction::Download, &item()).await.is_error());
        assert!(perform_share(&target, ShareAction::Share, &item()).await.is_error());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a.png").as_deref(), Some("a.png"));
        assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_file_name("dir\\b.jpg").as_deref(), Some("b.jpg"));
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("x/"), None);
    }

    #[tokio::test]
    async fn test_directory_target_saves_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello")
                .await
                .unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path().join("downloads"), &FeedConfig::default()).unwrap();
        let path = target
            .download(&format!("http://{addr}/images/a.png"), "a.png")
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("downloads").join("a.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_directory_target_shares_link() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path(), &FeedConfig::default()).unwrap();
        assert_eq!(
            target.share("http://h/a.png", "a.png").await.unwrap(),
            ShareMethod::CopiedLink("http://h/a.png".into())
        );
    }
}
