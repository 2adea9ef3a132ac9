mod common;

use crate::common::TestHost;
use node_debug_resolver::resolver::config::{LaunchConfiguration, ProcessId, Request};
use node_debug_resolver::resolver::error::Error;
use node_debug_resolver::resolver::host::{MemoryEnvironment, MemoryFileSystem, OsFamily};
use node_debug_resolver::resolver::protocol::{DebugType, ProtocolKind, ProtocolSetting};
use node_debug_resolver::resolver::Resolution;

fn attach(process_id: ProcessId) -> LaunchConfiguration {
    LaunchConfiguration {
        request: Some(Request::Attach),
        name: Some("Attach to Process".to_string()),
        process_id: Some(process_id),
        ..Default::default()
    }
}

fn launch() -> LaunchConfiguration {
    LaunchConfiguration {
        request: Some(Request::Launch),
        name: Some("Launch Program".to_string()),
        program: Some("/src/app.js".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_explicit_legacy_protocol_skips_probe() {
    let host = TestHost {
        probe: Some(ProtocolKind::Inspector),
        ..Default::default()
    };
    let mut config = attach(ProcessId::String("4242".to_string()));
    config.protocol = Some(ProtocolSetting::Legacy);

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node)));
    assert_eq!(host.info.activations(), vec![4242]);
    assert_eq!(host.info.probes.get(), 0);
    assert_eq!(config.debug_type, Some(DebugType::Node));
    assert_eq!(config.process_id, None);
    assert_eq!(config.port, Some(5858));
}

#[test]
fn test_inspector_port_skips_probe() {
    let host = TestHost {
        probe: Some(ProtocolKind::Legacy),
        ..Default::default()
    };
    let mut config = attach(ProcessId::Number(4242));
    config.port = Some(9229);

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node2)));
    assert_eq!(host.info.probes.get(), 0);
    assert_eq!(host.info.activations(), vec![4242]);
    assert_eq!(config.port, Some(9229));
    assert_eq!(config.process_id, None);
}

#[test]
fn test_probed_pid_resolved_to_port() {
    let host = TestHost {
        probe: Some(ProtocolKind::Inspector),
        ..Default::default()
    };
    let mut config = attach(ProcessId::Number(4242));

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node2)));
    assert_eq!(host.info.probes.get(), 1);
    assert_eq!(config.debug_type, Some(DebugType::Node2));
    assert_eq!(config.process_id, None);
    assert_eq!(config.port, Some(9229));
    assert_eq!(host.info.auto_detects.get(), 0);
}

#[test]
fn test_unknown_protocol_keeps_configuration() {
    let host = TestHost::default();
    let mut config = attach(ProcessId::Number(4242));

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(None));
    assert_eq!(host.info.activations(), vec![4242]);
    assert_eq!(host.info.probes.get(), 1);
    assert_eq!(config.debug_type, None);
    assert_eq!(config.process_id, Some(ProcessId::Number(4242)));
    assert_eq!(config.port, None);
    assert!(host.info.notifications().is_empty());
}

#[test]
fn test_not_a_process_id() {
    let host = TestHost::default();
    let mut config = attach(ProcessId::String("abc".to_string()));

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Aborted);
    assert_eq!(config.debug_type, None);
    assert!(host.info.activations().is_empty());

    let notifications = host.info.notifications();
    assert_eq!(notifications.len(), 1);
    let (message, modal) = &notifications[0];
    assert!(message.contains("doesn't look like a process id"), "{message}");
    assert!(message.contains("abc"));
    assert!(modal);
}

#[test]
fn test_cancelled_pick_aborts_silently() {
    for answer in [None, Some(""), Some("  \n")] {
        let host = TestHost {
            pick: answer.map(ToString::to_string),
            ..Default::default()
        };
        let mut config = attach(ProcessId::String("${command:PickProcess}".to_string()));

        let resolution = host.resolver().resolve(&mut config).unwrap();

        assert_eq!(resolution, Resolution::Aborted);
        assert_eq!(host.info.picks.get(), 1);
        assert!(host.info.notifications().is_empty());
        assert!(host.info.activations().is_empty());
        assert_eq!(config.debug_type, None);
    }
}

#[test]
fn test_picked_pid() {
    let host = TestHost {
        pick: Some("4242\n".to_string()),
        probe: Some(ProtocolKind::Legacy),
        ..Default::default()
    };
    let mut config = attach(ProcessId::String(
        "${command:extension.pickNodeProcess}".to_string(),
    ));

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node)));
    assert_eq!(host.info.activations(), vec![4242]);
    assert_eq!(config.port, Some(5858));
    assert_eq!(config.process_id, None);
}

#[test]
fn test_picked_garbage() {
    let host = TestHost {
        pick: Some("node server.js".to_string()),
        ..Default::default()
    };
    let mut config = attach(ProcessId::String("${command:PickProcess}".to_string()));

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Aborted);
    assert_eq!(host.info.notifications().len(), 1);
    assert!(host.info.activations().is_empty());
}

#[test]
fn test_activation_failure_aborts() {
    let host = TestHost {
        activation_fails: true,
        probe: Some(ProtocolKind::Inspector),
        ..Default::default()
    };
    let mut config = attach(ProcessId::Number(4242));

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Aborted);
    assert_eq!(host.info.probes.get(), 0);
    assert_eq!(config.debug_type, None);
    assert_eq!(config.process_id, Some(ProcessId::Number(4242)));

    let notifications = host.info.notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].0.contains("cannot enable debug mode for process '4242'"));
}

#[test]
fn test_explicit_protocol_without_pid() {
    let host = TestHost {
        auto: Some(DebugType::Node),
        ..Default::default()
    };
    let mut config = launch();
    config.protocol = Some(ProtocolSetting::Inspector);

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node2)));
    assert_eq!(config.debug_type, Some(DebugType::Node2));
    assert!(host.info.activations().is_empty());
    assert_eq!(host.info.auto_detects.get(), 0);
}

#[test]
fn test_auto_detect() {
    let host = TestHost {
        auto: Some(DebugType::Node2),
        ..Default::default()
    };
    let mut config = launch();
    config.protocol = Some(ProtocolSetting::Auto);

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node2)));
    assert_eq!(host.info.auto_detects.get(), 1);
    assert_eq!(config.debug_type, Some(DebugType::Node2));
}

#[test]
fn test_auto_detect_without_answer_keeps_type() {
    let host = TestHost::default();
    let mut config = launch();
    config.debug_type = Some(DebugType::Node);

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(None));
    assert_eq!(config.debug_type, Some(DebugType::Node));
}

#[test]
fn test_process_id_ignored_on_launch() {
    let host = TestHost {
        auto: Some(DebugType::Node),
        ..Default::default()
    };
    let mut config = launch();
    config.process_id = Some(ProcessId::String("abc".to_string()));

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node)));
    assert!(host.info.notifications().is_empty());
    assert!(host.info.activations().is_empty());
}

#[test]
fn test_runtime_version_from_nvm() {
    let host = TestHost {
        auto: Some(DebugType::Node2),
        env: MemoryEnvironment::new()
            .with_home("/home/user")
            .with_var("PATH", "/usr/bin:/bin"),
        fs: MemoryFileSystem::new()
            .with_dir("/home/user/.nvm")
            .with_dir("/home/user/.nvm/versions/node/v16.2.0/bin"),
        ..Default::default()
    };
    let mut config = launch();
    config.runtime_version = Some("16.2.0".to_string());

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node2)));
    assert_eq!(
        config.env.as_ref().unwrap().get("PATH").unwrap(),
        "/home/user/.nvm/versions/node/v16.2.0/bin:/usr/bin:/bin"
    );
}

#[test]
fn test_runtime_version_from_nvs() {
    let host = TestHost {
        env: MemoryEnvironment::new()
            .with_var("NVS_HOME", "/opt/nvs")
            .with_var("PATH", "/usr/bin"),
        fs: MemoryFileSystem::new().with_dir("/opt/nvs/lts/16/x64/bin"),
        ..Default::default()
    };
    let mut config = launch();
    config.runtime_version = Some("lts/16/x64".to_string());
    config.protocol = Some(ProtocolSetting::Legacy);

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node)));
    assert_eq!(
        config.env.as_ref().unwrap().get("PATH").unwrap(),
        "/opt/nvs/lts/16/x64/bin:/usr/bin"
    );
}

#[test]
fn test_runtime_version_not_installed() {
    let host = TestHost {
        auto: Some(DebugType::Node2),
        env: MemoryEnvironment::new().with_var("NVM_DIR", "/nvm"),
        ..Default::default()
    };
    let mut config = launch();
    config.runtime_version = Some("14".to_string());

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Aborted);
    assert_eq!(host.info.auto_detects.get(), 0);
    assert_eq!(config.debug_type, None);
    assert!(config.env.is_none());

    let notifications = host.info.notifications();
    assert_eq!(
        notifications,
        vec![("Node.js version '14' not installed for 'nvm'".to_string(), true)]
    );
}

#[test]
fn test_runtime_version_ignored_on_attach() {
    let host = TestHost {
        probe: Some(ProtocolKind::Inspector),
        ..Default::default()
    };
    let mut config = attach(ProcessId::Number(4242));
    config.runtime_version = Some("99".to_string());

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Resolved(Some(DebugType::Node2)));
    assert_eq!(host.info.activations(), vec![4242]);
    assert!(host.info.notifications().is_empty());
    assert!(config.env.is_none());
    assert_eq!(config.port, Some(9229));
}

#[test]
fn test_version_manager_missing_on_windows() {
    let host = TestHost {
        os: OsFamily::Windows,
        ..Default::default()
    };
    let mut config = launch();
    config.runtime_version = Some("14".to_string());

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Aborted);
    let notifications = host.info.notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].0.contains("nvm-windows"));
}

#[test]
fn test_malformed_runtime_version_propagates() {
    let host = TestHost {
        env: MemoryEnvironment::new().with_var("NVM_DIR", "/nvm"),
        ..Default::default()
    };
    let mut config = launch();
    config.runtime_version = Some("not-a-version!".to_string());

    let err = host.resolver().resolve(&mut config).unwrap_err();

    assert!(matches!(err, Error::InvalidVersion(ref v) if v == "not-a-version!"));
    assert!(host.info.notifications().is_empty());
    assert_eq!(config.debug_type, None);
}

#[test]
fn test_invalid_port_aborts() {
    let host = TestHost::default();
    let mut config = attach(ProcessId::Number(4242));
    config.port = Some(0);

    let resolution = host.resolver().resolve(&mut config).unwrap();

    assert_eq!(resolution, Resolution::Aborted);
    assert!(host.info.activations().is_empty());
    assert_eq!(host.info.notifications().len(), 1);
}
