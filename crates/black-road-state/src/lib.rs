//! Remote Terraform state synchronization
//!
//! The state object lives in the Terraform S3 bucket under the
//! project-derived key, gpg-encrypted. `pull` runs before any provisioning
//! touches local state; `push` runs only after provisioning succeeds, so a
//! failed apply never publishes its state. Backend credentials are passed
//! to each AWS CLI invocation as that child's environment, never the
//! parent's.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use black_road_core::config::require;
use black_road_core::{paths, process, Config, WorkPaths};
use black_road_secrets::GpgCodec;

/// Synchronizes the local state file with its remote encrypted copy
#[derive(Debug, Clone)]
pub struct StateSync {
    aws_program: String,
    gpg_program: String,
    work: WorkPaths,
}

impl StateSync {
    /// Synchronizer using `aws` and `gpg` from PATH
    pub fn new(work: WorkPaths) -> Self {
        Self {
            aws_program: "aws".to_string(),
            gpg_program: "gpg".to_string(),
            work,
        }
    }

    /// Override the external binaries (tests, non-standard installs)
    pub fn with_programs(
        mut self,
        aws_program: impl Into<String>,
        gpg_program: impl Into<String>,
    ) -> Self {
        self.aws_program = aws_program.into();
        self.gpg_program = gpg_program.into();
        self
    }

    /// Download and decrypt the remote state, if it exists.
    ///
    /// An absent remote object is the first-run case: local state is left
    /// alone and provisioning starts from scratch.
    pub async fn pull(&self, config: &Config) -> Result<()> {
        let project = config.project_name()?;
        let backend = Backend::from_config(config)?;
        let env = backend.env();
        let object_key = paths::state_object_key(project);

        let head = process::run(
            &self.aws_program,
            &[
                "s3api",
                "head-object",
                "--bucket",
                backend.bucket,
                "--key",
                &object_key,
            ],
            &env,
        )
        .await?;
        if !head.status.success() {
            info!("Remote Terraform state not found");
            return Ok(());
        }

        info!("Found remote Terraform state. Downloading...");
        std::fs::create_dir_all(self.work.sys_dir())?;
        let encrypted = self.work.encrypted_state(project);
        remove_if_exists(&encrypted)?;

        let url = format!("s3://{}/{}", backend.bucket, object_key);
        let sys_dir = self.work.sys_dir().display().to_string();
        process::run_checked(
            &self.aws_program,
            &["s3", "cp", &url, &sys_dir, "--endpoint-url", backend.endpoint],
            &env,
        )
        .await
        .context("state download failed")?;
        info!("Downloaded remote Terraform state");

        info!("Decrypting remote Terraform state");
        let state = self.work.state_file();
        remove_if_exists(&state)?;
        self.codec(config)?
            .decrypt_file(&encrypted, &state)
            .await?;
        info!("Decrypted remote Terraform state");
        Ok(())
    }

    /// Encrypt the local state file and upload it under the project key
    pub async fn push(&self, config: &Config) -> Result<()> {
        let project = config.project_name()?;
        let backend = Backend::from_config(config)?;
        let env = backend.env();
        let object_key = paths::state_object_key(project);

        info!("Encrypting remote Terraform state");
        std::fs::create_dir_all(self.work.sys_dir())?;
        let encrypted = self.work.encrypted_state(project);
        remove_if_exists(&encrypted)?;
        self.codec(config)?
            .encrypt_file(&self.work.state_file(), &encrypted)
            .await?;

        info!("Saving remote Terraform state");
        let url = format!("s3://{}/{}", backend.bucket, object_key);
        let encrypted_s = encrypted.display().to_string();
        process::run_checked(
            &self.aws_program,
            &[
                "s3",
                "cp",
                &encrypted_s,
                &url,
                "--endpoint-url",
                backend.endpoint,
            ],
            &env,
        )
        .await
        .context("state upload failed")?;
        info!("Saved remote Terraform state");
        Ok(())
    }

    fn codec(&self, config: &Config) -> Result<GpgCodec> {
        let key = require(&config.gpg.key, "gpg.key")?;
        Ok(GpgCodec::new(key).with_program(&self.gpg_program))
    }
}

/// Terraform S3 backend parameters, all required for sync
struct Backend<'a> {
    endpoint: &'a str,
    bucket: &'a str,
    access_key: &'a str,
    secret_key: &'a str,
}

impl<'a> Backend<'a> {
    fn from_config(config: &'a Config) -> Result<Self> {
        let s3 = &config.terraform.s3;
        Ok(Self {
            endpoint: require(&s3.endpoint, "terraform.s3.endpoint")?,
            bucket: require(&s3.bucket, "terraform.s3.bucket")?,
            access_key: require(&s3.access_key, "terraform.s3.accessKey")?,
            secret_key: require(&s3.secret_key, "terraform.s3.secretKey")?,
        })
    }

    fn env(&self) -> [(&'static str, &'a str); 3] {
        [
            ("AWS_ACCESS_KEY_ID", self.access_key),
            ("AWS_SECRET_ACCESS_KEY", self.secret_key),
            ("AWS_ENDPOINT_URL", self.endpoint),
        ]
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn stub(dir: &Path, name: &str, script: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path.display().to_string()
    }

    /// gpg stand-in: copies the input file to the `-o` target, logging the
    /// call. Mirrors the shape of real encrypt/decrypt file invocations.
    fn gpg_stub(dir: &Path, log: &Path) -> String {
        let script = format!(
            "#!/bin/sh\n\
             echo \"gpg $*\" >> {log}\n\
             out=\"\"\n\
             in=\"\"\n\
             while [ $# -gt 0 ]; do\n\
               case \"$1\" in\n\
                 -o) out=\"$2\"; shift 2 ;;\n\
                 -r) shift 2 ;;\n\
                 -*) shift ;;\n\
                 *) in=\"$1\"; shift ;;\n\
               esac\n\
             done\n\
             cat \"$in\" > \"$out\"\n",
            log = log.display(),
        );
        stub(dir, "gpg", &script)
    }

    /// aws stand-in: head-object exits per `head_rc`; `s3 cp` from an
    /// s3:// source materializes the object into the destination dir.
    fn aws_stub(dir: &Path, log: &Path, head_rc: i32, object_key: &str) -> String {
        let script = format!(
            "#!/bin/sh\n\
             echo \"aws $*\" >> {log}\n\
             if [ \"$1 $2\" = \"s3api head-object\" ]; then exit {head_rc}; fi\n\
             if [ \"$1 $2\" = \"s3 cp\" ]; then\n\
               case \"$3\" in\n\
                 s3://*) echo 'encrypted-state' > \"$4/{key}\" ;;\n\
               esac\n\
             fi\n\
             exit 0\n",
            log = log.display(),
            head_rc = head_rc,
            key = object_key,
        );
        stub(dir, "aws", &script)
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.name = Some("prod".into());
        config.gpg.key = Some("ops@example.com".into());
        config.terraform.s3.endpoint = Some("https://s3.example.com".into());
        config.terraform.s3.region = Some("eu-west-1".into());
        config.terraform.s3.bucket = Some("tf-backend".into());
        config.terraform.s3.access_key = Some("AKIATF".into());
        config.terraform.s3.secret_key = Some("tf-secret".into());
        config
    }

    #[tokio::test]
    async fn test_pull_absent_remote_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("invocations.log");
        let aws = aws_stub(dir.path(), &log, 1, "prod.tfsate");
        let gpg = gpg_stub(dir.path(), &log);

        let sync = StateSync::new(WorkPaths::new(dir.path())).with_programs(&aws, &gpg);
        sync.pull(&test_config()).await.unwrap();

        let logged = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = logged.lines().collect();
        // Only the existence check ran; nothing was downloaded or
        // decrypted and no local state appeared.
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("aws s3api head-object"));
        assert!(lines[0].contains("--key prod.tfsate"));
        assert!(!WorkPaths::new(dir.path()).state_file().exists());
    }

    #[tokio::test]
    async fn test_pull_downloads_and_decrypts() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("invocations.log");
        let aws = aws_stub(dir.path(), &log, 0, "prod.tfsate");
        let gpg = gpg_stub(dir.path(), &log);
        let work = WorkPaths::new(dir.path());

        // A stale plaintext state must be replaced by the remote copy.
        std::fs::write(work.state_file(), b"stale").unwrap();

        let sync = StateSync::new(work.clone()).with_programs(&aws, &gpg);
        sync.pull(&test_config()).await.unwrap();

        let logged = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = logged.lines().collect();
        assert!(lines[0].starts_with("aws s3api head-object"));
        assert!(lines[1].starts_with("aws s3 cp s3://tf-backend/prod.tfsate"));
        assert!(lines[1].contains("--endpoint-url https://s3.example.com"));
        assert!(lines[2].starts_with("gpg"));

        assert_eq!(
            std::fs::read_to_string(work.state_file()).unwrap().trim(),
            "encrypted-state"
        );
    }

    #[tokio::test]
    async fn test_push_encrypts_before_upload() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("invocations.log");
        let aws = aws_stub(dir.path(), &log, 0, "prod.tfsate");
        let gpg = gpg_stub(dir.path(), &log);
        let work = WorkPaths::new(dir.path());

        std::fs::write(work.state_file(), b"{\"serial\": 9}").unwrap();

        let sync = StateSync::new(work.clone()).with_programs(&aws, &gpg);
        sync.push(&test_config()).await.unwrap();

        let logged = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = logged.lines().collect();
        // Encryption strictly precedes the upload.
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("gpg"));
        assert!(lines[1].starts_with("aws s3 cp"));
        assert!(lines[1].contains("s3://tf-backend/prod.tfsate"));

        // The staging copy holds the encrypted (here: copied) state.
        let staged = std::fs::read_to_string(work.encrypted_state("prod")).unwrap();
        assert_eq!(staged, "{\"serial\": 9}");
    }

    #[tokio::test]
    async fn test_pull_requires_project_name() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.name = None;

        let sync = StateSync::new(WorkPaths::new(dir.path()));
        let err = sync.pull(&config).await.unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
