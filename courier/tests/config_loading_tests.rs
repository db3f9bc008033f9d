/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
//! Tests for loading `CourierConfig` from disk.

use std::fs;
use std::time::Duration;

use courier::prelude::*;
use courier_test::prelude::*;
use tempfile::TempDir;

use crate::setup::*;
use crate::setup::messages::*;

mod setup;

#[courier_test]
async fn test_config_file_overrides_defaults() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [timeouts]
        tracking_timeout_ms = 750

        [behavior]
        fail_on_handler_errors = true
        "#,
    )?;

    let config = CourierConfig::load_from(&path);
    assert_eq!(config.tracking_timeout(), Duration::from_millis(750));
    assert!(config.behavior.fail_on_handler_errors);
    assert!(!config.behavior.log_payloads);

    temp_dir.close()?;
    Ok(())
}

#[courier_test]
async fn test_malformed_or_missing_file_falls_back_to_defaults() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new()?;
    let malformed = temp_dir.path().join("config.toml");
    fs::write(&malformed, "[timeouts\ntracking_timeout_ms = ")?;

    assert_eq!(CourierConfig::load_from(&malformed), CourierConfig::default());
    assert_eq!(
        CourierConfig::load_from(&temp_dir.path().join("absent.toml")),
        CourierConfig::default()
    );

    temp_dir.close()?;
    Ok(())
}

#[courier_test]
async fn test_bus_uses_configured_defaults() -> anyhow::Result<()> {
    initialize_tracing();
    let config = CourierConfig::load_from_str(
        r#"
        [timeouts]
        tracking_timeout_ms = 100

        [behavior]
        fail_on_handler_errors = true
        log_payloads = true
        "#,
    )?;
    let bus = CourierApp::builder()
        .handle_fn::<Hang, _, _>("hang", |_context| async {
            std::future::pending::<HandlerResult>().await
        })
        .handle_fn::<Explode, _, _>("fragile", |_context| async {
            Err(anyhow::anyhow!("disk full"))
        })
        .with_config(config.clone())
        .build();
    assert_eq!(bus.config(), &config);

    // The configured deadline applies without an explicit timeout.
    let timed_out = bus
        .track_activity()
        .send_message_and_wait(Hang)
        .await
        .unwrap_err();
    assert!(matches!(
        timed_out,
        TrackingError::Timeout { timeout, .. } if timeout == Duration::from_millis(100)
    ));

    // So does the failure policy.
    let failed = bus
        .track_activity()
        .send_message_and_wait(Explode)
        .await
        .unwrap_err();
    assert!(matches!(failed, TrackingError::HandlerFailed { .. }));
    Ok(())
}

#[courier_test]
async fn test_config_is_loaded_from_xdg_config_home() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new()?;
    let config_dir = temp_dir.path().join("courier");
    fs::create_dir_all(&config_dir)?;
    fs::write(
        config_dir.join("config.toml"),
        "[timeouts]\ntracking_timeout_ms = 1234\n",
    )?;
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let config = CourierConfig::load();
    assert_eq!(config.timeouts.tracking_timeout_ms, 1234);

    temp_dir.close()?;
    Ok(())
}
