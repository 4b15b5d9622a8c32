//! Artifact upload over FTP or SFTP.
//!
//! Upload failures are reported to the caller, who logs them; a published
//! file on disk with a failed upload is still a successful run.

use std::io::Write;
use std::net::TcpStream;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{UploadMethod, UploadSettings};

/// Errors raised during upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Connecting to the remote host failed.
    #[error("failed to connect to {host}: {message}")]
    Connect { host: String, message: String },

    /// Authentication against the remote host failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The transfer itself failed.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The local artifact could not be read.
    #[error("failed to read artifact: {0}")]
    Local(#[from] std::io::Error),
}

/// Uploads the artifact with the configured transport.
pub fn upload_artifact(settings: &UploadSettings, artifact: &Path) -> Result<(), UploadError> {
    if settings.method == UploadMethod::Ftp {
        warn!(host = %settings.host, "FTP sends credentials unencrypted; prefer sftp");
    }

    let contents = std::fs::read(artifact)?;

    match settings.method {
        UploadMethod::Ftp => upload_ftp(settings, &contents)?,
        UploadMethod::Sftp => upload_sftp(settings, &contents)?,
    }

    info!(
        host = %settings.host,
        remote_path = %settings.remote_path,
        bytes = contents.len(),
        "Uploaded artifact"
    );

    Ok(())
}

fn upload_ftp(settings: &UploadSettings, contents: &[u8]) -> Result<(), UploadError> {
    use suppaftp::FtpStream;
    use suppaftp::types::FileType;

    let addr = format!("{}:{}", settings.host, settings.effective_port());
    let mut ftp = FtpStream::connect(&addr).map_err(|e| UploadError::Connect {
        host: addr.clone(),
        message: e.to_string(),
    })?;

    let username = settings.username.as_deref().unwrap_or("anonymous");
    let password = settings.password.as_deref().unwrap_or("");
    ftp.login(username, password)
        .map_err(|e| UploadError::Auth(e.to_string()))?;

    ftp.transfer_type(FileType::Binary)
        .map_err(|e| UploadError::Transfer(e.to_string()))?;

    let mut reader = std::io::Cursor::new(contents);
    ftp.put_file(&settings.remote_path, &mut reader)
        .map_err(|e| UploadError::Transfer(e.to_string()))?;

    // A failed QUIT after a complete transfer is not worth failing the
    // upload for.
    let _ = ftp.quit();

    Ok(())
}

fn upload_sftp(settings: &UploadSettings, contents: &[u8]) -> Result<(), UploadError> {
    let addr = format!("{}:{}", settings.host, settings.effective_port());
    let tcp = TcpStream::connect(&addr).map_err(|e| UploadError::Connect {
        host: addr.clone(),
        message: e.to_string(),
    })?;

    let mut session = ssh2::Session::new().map_err(|e| UploadError::Transfer(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| UploadError::Connect {
            host: addr,
            message: e.to_string(),
        })?;

    let username = settings
        .username
        .as_deref()
        .ok_or_else(|| UploadError::Auth("sftp requires a username".to_string()))?;

    if let Some(ref key) = settings.private_key {
        session
            .userauth_pubkey_file(username, None, key, settings.passphrase.as_deref())
            .map_err(|e| UploadError::Auth(e.to_string()))?;
    } else if let Some(ref password) = settings.password {
        session
            .userauth_password(username, password)
            .map_err(|e| UploadError::Auth(e.to_string()))?;
    } else {
        return Err(UploadError::Auth(
            "sftp requires a password or private_key".to_string(),
        ));
    }

    let sftp = session
        .sftp()
        .map_err(|e| UploadError::Transfer(e.to_string()))?;
    let mut remote = sftp
        .create(Path::new(&settings.remote_path))
        .map_err(|e| UploadError::Transfer(e.to_string()))?;
    remote
        .write_all(contents)
        .map_err(|e| UploadError::Transfer(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sftp_settings() -> UploadSettings {
        UploadSettings {
            method: UploadMethod::Sftp,
            host: "127.0.0.1".to_string(),
            // Unroutable port keeps the connection failure local and fast.
            port: Some(1),
            username: Some("publisher".to_string()),
            password: Some("secret".to_string()),
            private_key: None,
            passphrase: None,
            remote_path: "/srv/feeds/busy.ics".to_string(),
        }
    }

    #[test]
    fn missing_artifact_is_a_local_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ics");

        let result = upload_artifact(&sftp_settings(), &missing);
        assert!(matches!(result, Err(UploadError::Local(_))));
    }

    #[test]
    fn unreachable_host_is_a_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("busy.ics");
        std::fs::write(&artifact, b"BEGIN:VCALENDAR\r\n").unwrap();

        let result = upload_artifact(&sftp_settings(), &artifact);
        assert!(matches!(result, Err(UploadError::Connect { .. })));
    }
}
