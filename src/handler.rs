//! Invocation handler
//!
//! Entry point called by the host for every invocation: resolve the
//! configuration, back up the pool, then run the retention sweep when
//! rotation is enabled.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, info_span, warn, Span};

use crate::backup::{
    backup_timestamp, BackupOrchestrator, BackupReport, RetentionSweeper, SweepReport,
};
use crate::cloud::CloudConnector;
use crate::config::{
    BackupConfig, ConfigResolver, Environment, InvocationEvent, Response, Retention,
};
use crate::error::{BackupError, BackupResult};

pub const SUCCESS_MESSAGE: &str = "Backup has completed successfully!";
pub const FAILURE_MESSAGE: &str = "Backup has failed.";
pub const CONFIG_FAILURE_MESSAGE: &str = "Backup execution has failed.";

/// A failed invocation: the response for the host plus the cause
#[derive(Error, Debug)]
#[error("{message}")]
pub struct InvocationFailure {
    pub message: String,
    #[source]
    pub error: BackupError,
}

impl InvocationFailure {
    fn new(message: &str, error: BackupError) -> Self {
        Self {
            message: message.to_string(),
            error,
        }
    }

    /// Response record to hand back to the host
    pub fn response(&self) -> Response {
        Response::new(self.message.clone())
    }
}

/// What one successful execution did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub backup: BackupReport,
    /// `None` when rotation is disabled
    pub sweep: Option<SweepReport>,
}

/// Handles invocations against the services produced by `C`
pub struct Handler<C> {
    resolver: ConfigResolver,
    connector: C,
    span: Span,
}

impl<C: CloudConnector> Handler<C> {
    /// Create a handler; all of its logging happens inside `span`
    pub fn new(env: Environment, connector: C, span: Span) -> Self {
        let resolver = ConfigResolver::new(env, info_span!(parent: &span, "config"));
        Self {
            resolver,
            connector,
            span,
        }
    }

    /// Resolve the configuration without running a backup
    pub fn resolve(&self, event: Option<&InvocationEvent>) -> BackupResult<BackupConfig> {
        self.resolver.resolve(event)
    }

    /// Run one invocation
    pub fn handle(&self, event: Option<&InvocationEvent>) -> Result<Response, InvocationFailure> {
        let _enter = self.span.enter();
        info!(event = ?event, "Handling invocation");

        let config = self
            .resolver
            .resolve(event)
            .map_err(|e| {
                error!("Configuration could not be resolved: {}", e);
                InvocationFailure::new(CONFIG_FAILURE_MESSAGE, e)
            })?;

        match self.execute(&config, Utc::now()) {
            Ok(_) => Ok(Response::new(SUCCESS_MESSAGE)),
            Err(e) => {
                error!("Backup failed: {}", e);
                Err(InvocationFailure::new(FAILURE_MESSAGE, e))
            }
        }
    }

    /// Back up and rotate for a resolved configuration at `now`
    pub fn execute(
        &self,
        config: &BackupConfig,
        now: DateTime<Utc>,
    ) -> BackupResult<ExecutionReport> {
        let clients = self.connector.connect(config)?;
        let timestamp = backup_timestamp(now);

        let orchestrator = BackupOrchestrator::new(
            clients.directory.as_ref(),
            clients.keys.as_ref(),
            clients.store.as_ref(),
            info_span!(parent: &self.span, "backup", timestamp = %timestamp),
        );
        let backup = orchestrator.run(config, &timestamp)?;

        let sweep = match config.retention {
            Retention::Enabled { days } => {
                let sweeper = RetentionSweeper::new(
                    clients.store.as_ref(),
                    info_span!(parent: &self.span, "rotation", days),
                );
                Some(sweeper.sweep(&config.bucket_name, days, now)?)
            }
            Retention::Disabled => {
                warn!(
                    "Rotation is disabled; enable it via the ROTATION_ENABLED env variable or rotationEnabled in the event body"
                );
                None
            }
        };

        Ok(ExecutionReport { backup, sweep })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{CloudClients, LocalCloud};
    use crate::config::{env_vars, CloudPaths};
    use crate::crypto::MockKeyService;
    use crate::directory::{
        DirectoryService, GroupType, MockDirectoryService, PoolExport, UserListing, UserType,
    };
    use crate::error::ServiceError;
    use crate::storage::file_io::write_json_atomic;
    use crate::storage::{
        MockObjectStore, ObjectAcl, ObjectStore, PutObjectRequest, ServerSideEncryption,
    };
    use std::cell::RefCell;
    use tempfile::TempDir;

    const REGION: &str = "eu-west-1";
    const POOL: &str = "eu-west-1_pool";
    const BUCKET: &str = "cognito-backups";
    const KEY: &str = "alias/backup";

    /// Hands out a prepared set of clients once
    struct PreparedConnector(RefCell<Option<CloudClients>>);

    impl CloudConnector for PreparedConnector {
        fn connect(&self, _config: &BackupConfig) -> BackupResult<CloudClients> {
            Ok(self.0.borrow_mut().take().expect("connect called twice"))
        }
    }

    fn test_env(extra: &[(&str, &str)]) -> Environment {
        let mut env = Environment::from_pairs([
            (env_vars::REGION, REGION),
            (env_vars::USER_POOL_ID, POOL),
            (env_vars::USER_POOL_REGION, REGION),
            (env_vars::BUCKET_NAME, BUCKET),
            (env_vars::BUCKET_REGION, REGION),
            (env_vars::KEY_ID, KEY),
            (env_vars::KEY_REGION, REGION),
        ]);
        for (k, v) in extra {
            env.set(*k, *v);
        }
        env
    }

    fn local_cloud() -> (LocalCloud, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cloud = LocalCloud::new(CloudPaths::with_root(temp_dir.path().to_path_buf()));

        let export = PoolExport {
            users: vec![UserType::new("alice"), UserType::new("bob")],
            groups: vec![GroupType::new("admins")],
        };
        let export_path = cloud.directory(REGION).export_path(POOL).unwrap();
        write_json_atomic(export_path, &export).unwrap();
        cloud.keyring(REGION).create_key(KEY).unwrap();
        cloud.store(REGION).create_bucket(BUCKET).unwrap();

        (cloud, temp_dir)
    }

    #[test]
    fn test_successful_invocation_writes_one_folder() {
        let (cloud, _temp) = local_cloud();
        let handler = Handler::new(
            test_env(&[(env_vars::BACKUP_PREFIX, "platform")]),
            cloud.clone(),
            Span::none(),
        );

        let response = handler.handle(None).unwrap();
        assert_eq!(response.message, SUCCESS_MESSAGE);

        let objects = cloud.store(REGION).list_objects(BUCKET).unwrap();
        assert_eq!(objects.len(), 2);

        let folders: Vec<_> = objects
            .iter()
            .map(|o| o.key.rsplit_once('/').unwrap().0.to_string())
            .collect();
        assert_eq!(folders[0], folders[1]);
        assert!(folders[0].starts_with("platform/"));

        let mut names: Vec<_> = objects
            .iter()
            .map(|o| o.key.rsplit_once('/').unwrap().1.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["groups.json", "users.json"]);
    }

    #[test]
    fn test_stored_users_decrypt_to_listing() {
        let (cloud, _temp) = local_cloud();
        let handler = Handler::new(test_env(&[]), cloud.clone(), Span::none());

        let config = handler.resolve(None).unwrap();
        let report = handler.execute(&config, Utc::now()).unwrap();
        assert!(report.sweep.is_none());

        let users_key = &report.backup.objects[0];
        assert!(users_key.ends_with("/users.json"));

        let store = cloud.store(REGION);
        let meta = store.head_object(BUCKET, users_key).unwrap();
        assert_eq!(meta.tags["producer"], "cognito-backup");
        assert_eq!(meta.content_disposition, "attachment");

        let blob = store.get_object(BUCKET, users_key).unwrap();
        let plaintext = cloud.keyring(REGION).decrypt(&blob).unwrap();
        let listing: UserListing = serde_json::from_slice(&plaintext).unwrap();
        assert_eq!(listing, cloud.directory(REGION).list_users(POOL).unwrap());
    }

    #[test]
    fn test_users_listing_failure_never_lists_groups() {
        let mut directory = MockDirectoryService::new();
        directory
            .expect_list_users()
            .times(1)
            .returning(|_| {
                Err(ServiceError::new("cognito-idp", "pool gone")
                    .with_code("ResourceNotFoundException"))
            });
        directory.expect_list_groups().times(0);

        let mut keys = MockKeyService::new();
        keys.expect_encrypt().never();
        let mut store = MockObjectStore::new();
        store.expect_put_object().never();
        store.expect_list_objects().never();

        let connector = PreparedConnector(RefCell::new(Some(CloudClients {
            directory: Box::new(directory),
            keys: Box::new(keys),
            store: Box::new(store),
        })));
        let handler = Handler::new(
            test_env(&[
                (env_vars::RETENTION_ENABLED, "true"),
                (env_vars::RETENTION_DAYS, "7"),
            ]),
            connector,
            Span::none(),
        );

        let failure = handler.handle(None).unwrap_err();
        assert_eq!(failure.response().message, FAILURE_MESSAGE);
        assert!(matches!(failure.error, BackupError::Directory { .. }));
        assert_eq!(failure.error.service_code(), Some("ResourceNotFoundException"));
    }

    #[test]
    fn test_configuration_failure_never_connects() {
        struct NeverConnect;
        impl CloudConnector for NeverConnect {
            fn connect(&self, _config: &BackupConfig) -> BackupResult<CloudClients> {
                panic!("connect must not be called");
            }
        }

        let handler = Handler::new(Environment::default(), NeverConnect, Span::none());
        let failure = handler.handle(None).unwrap_err();

        assert_eq!(failure.response().message, CONFIG_FAILURE_MESSAGE);
        assert!(failure.error.is_config());
    }

    #[test]
    fn test_event_overrides_reach_backup() {
        let (cloud, _temp) = local_cloud();
        let handler = Handler::new(test_env(&[]), cloud.clone(), Span::none());

        let event = InvocationEvent {
            backup_prefix: "from-event".into(),
            ..Default::default()
        };
        handler.handle(Some(&event)).unwrap();

        let objects = cloud.store(REGION).list_objects(BUCKET).unwrap();
        assert!(objects.iter().all(|o| o.key.starts_with("from-event/")));
    }

    #[test]
    fn test_rotation_runs_after_backup() {
        let (cloud, _temp) = local_cloud();
        let handler = Handler::new(
            test_env(&[
                (env_vars::RETENTION_ENABLED, "true"),
                (env_vars::RETENTION_DAYS, "7"),
            ]),
            cloud.clone(),
            Span::none(),
        );

        let config = handler.resolve(None).unwrap();
        let first = handler.execute(&config, Utc::now()).unwrap();
        for key in &first.backup.objects {
            backdate(&cloud, key, 10);
        }

        // Objects outside the backup layout are swept too
        let store = cloud.store(REGION);
        store
            .put_object(
                BUCKET,
                PutObjectRequest {
                    key: "unrelated/report.csv".into(),
                    body: b"a,b".to_vec(),
                    acl: ObjectAcl::Private,
                    server_side_encryption: ServerSideEncryption::Aes256,
                    content_disposition: "inline".into(),
                    tagging: String::new(),
                },
            )
            .unwrap();
        backdate(&cloud, "unrelated/report.csv", 30);

        // Same second as the first run would overwrite its objects
        let report = handler
            .execute(&config, Utc::now() + chrono::Duration::seconds(1))
            .unwrap();
        let sweep = report.sweep.unwrap();

        assert_eq!(sweep.deleted.len(), 3);
        assert!(sweep.deleted.contains(&"unrelated/report.csv".to_string()));
        assert_eq!(sweep.retained, report.backup.objects.iter().rev().cloned().collect::<Vec<_>>());
        assert_eq!(store.list_objects(BUCKET).unwrap().len(), 2);
    }

    fn backdate(cloud: &LocalCloud, key: &str, days: i64) {
        let store = cloud.store(REGION);
        let mut meta = store.head_object(BUCKET, key).unwrap();
        meta.last_modified = meta.last_modified - chrono::Duration::days(days);

        let path = cloud
            .paths()
            .bucket_root(REGION)
            .join(BUCKET)
            .join("metadata")
            .join(format!("{}.meta.json", key));
        write_json_atomic(path, &meta).unwrap();
    }

    #[test]
    fn test_rotation_listing_failure_fails_invocation() {
        let mut directory = MockDirectoryService::new();
        directory
            .expect_list_users()
            .returning(|_| Ok(UserListing::default()));
        directory
            .expect_list_groups()
            .returning(|_| Ok(Default::default()));

        let mut keys = MockKeyService::new();
        keys.expect_encrypt().returning(|_, p| Ok(p.to_vec()));

        let mut store = MockObjectStore::new();
        store.expect_put_object().times(2).returning(|_, _| Ok(()));
        store
            .expect_list_objects()
            .times(1)
            .returning(|_| Err(ServiceError::new("s3", "denied").with_code("AccessDenied")));

        let connector = PreparedConnector(RefCell::new(Some(CloudClients {
            directory: Box::new(directory),
            keys: Box::new(keys),
            store: Box::new(store),
        })));
        let handler = Handler::new(
            test_env(&[
                (env_vars::RETENTION_ENABLED, "true"),
                (env_vars::RETENTION_DAYS, "7"),
            ]),
            connector,
            Span::none(),
        );

        let failure = handler.handle(None).unwrap_err();
        assert_eq!(failure.message, FAILURE_MESSAGE);
        assert!(matches!(failure.error, BackupError::Rotation { .. }));
    }

    #[test]
    fn test_missing_cloud_root() {
        let temp_dir = TempDir::new().unwrap();
        let cloud = LocalCloud::new(CloudPaths::with_root(temp_dir.path().join("missing")));
        let handler = Handler::new(test_env(&[]), cloud, Span::none());

        let failure = handler.handle(None).unwrap_err();
        assert_eq!(failure.message, FAILURE_MESSAGE);
        assert!(matches!(failure.error, BackupError::Connect(_)));
        assert!(!failure.error.is_config());
    }
}
