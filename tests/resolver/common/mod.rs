use node_debug_resolver::resolver::error::Error;
use node_debug_resolver::resolver::host::{
    AutoDetect, DebugModeActivator, HostInfo, MemoryEnvironment, MemoryFileSystem, Notifier,
    OsFamily, ProcessPicker, ProtocolProbe,
};
use node_debug_resolver::resolver::config::LaunchConfiguration;
use node_debug_resolver::resolver::protocol::{DebugType, ProtocolKind};
use node_debug_resolver::resolver::{Pid, Resolver, ResolverBuilder};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Calls observed by test capabilities.
#[derive(Clone, Default)]
pub struct TestInfo {
    pub picks: Rc<Cell<u32>>,
    pub activations: Rc<RefCell<Vec<Pid>>>,
    pub probes: Rc<Cell<u32>>,
    pub auto_detects: Rc<Cell<u32>>,
    pub notifications: Rc<RefCell<Vec<(String, bool)>>>,
}

impl TestInfo {
    pub fn notifications(&self) -> Vec<(String, bool)> {
        self.notifications.borrow().clone()
    }

    pub fn activations(&self) -> Vec<Pid> {
        self.activations.borrow().clone()
    }
}

struct TestPicker {
    info: TestInfo,
    answer: Option<String>,
}

impl ProcessPicker for TestPicker {
    fn pick(&self) -> anyhow::Result<Option<String>> {
        self.info.picks.set(self.info.picks.get() + 1);
        Ok(self.answer.clone())
    }
}

struct TestNotifier {
    info: TestInfo,
}

impl Notifier for TestNotifier {
    fn notify(&self, message: &str, modal: bool) {
        self.info
            .notifications
            .borrow_mut()
            .push((message.to_string(), modal));
    }
}

struct TestActivator {
    info: TestInfo,
    fail: bool,
}

impl DebugModeActivator for TestActivator {
    fn activate(&self, pid: Pid) -> Result<(), Error> {
        self.info.activations.borrow_mut().push(pid);
        if self.fail {
            return Err(Error::DebugModeActivation {
                pid,
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        Ok(())
    }
}

struct TestProbe {
    info: TestInfo,
    answer: Option<ProtocolKind>,
}

impl ProtocolProbe for TestProbe {
    fn probe(&self, _: Pid) -> Result<Option<ProtocolKind>, Error> {
        self.info.probes.set(self.info.probes.get() + 1);
        Ok(self.answer)
    }
}

struct TestAutoDetect {
    info: TestInfo,
    answer: Option<DebugType>,
}

impl AutoDetect for TestAutoDetect {
    fn detect(&self, _: &LaunchConfiguration) -> Option<DebugType> {
        self.info.auto_detects.set(self.info.auto_detects.get() + 1);
        self.answer
    }
}

/// Host with scripted capabilities.
pub struct TestHost {
    pub info: TestInfo,
    pub os: OsFamily,
    pub pick: Option<String>,
    pub activation_fails: bool,
    pub probe: Option<ProtocolKind>,
    pub auto: Option<DebugType>,
    pub env: MemoryEnvironment,
    pub fs: MemoryFileSystem,
}

impl Default for TestHost {
    fn default() -> Self {
        Self {
            info: TestInfo::default(),
            os: OsFamily::Unix,
            pick: None,
            activation_fails: false,
            probe: None,
            auto: None,
            env: MemoryEnvironment::new(),
            fs: MemoryFileSystem::new(),
        }
    }
}

impl TestHost {
    pub fn resolver(&self) -> Resolver {
        let info = &self.info;
        ResolverBuilder::new()
            .with_host(HostInfo {
                os: self.os,
                arch: "x64".to_string(),
                arm_version: None,
            })
            .with_environment(self.env.clone())
            .with_file_system(self.fs.clone())
            .with_picker(TestPicker {
                info: info.clone(),
                answer: self.pick.clone(),
            })
            .with_notifier(TestNotifier { info: info.clone() })
            .with_activator(TestActivator {
                info: info.clone(),
                fail: self.activation_fails,
            })
            .with_probe(TestProbe {
                info: info.clone(),
                answer: self.probe,
            })
            .with_auto_detect(TestAutoDetect {
                info: info.clone(),
                answer: self.auto,
            })
            .build()
    }
}
