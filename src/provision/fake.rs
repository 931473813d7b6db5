//! Scripted in-memory control plane for tests.
//!
//! Lookups miss with `NotFound` unless a resource was planted or created;
//! scripted sequences (operations, instance statuses) replay in order, with
//! the last entry repeating. Create calls are recorded so tests can assert
//! call counts and zone ordering.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::gcp::gce::Compute;
use crate::gcp::gce::error::GceError;
use crate::gcp::gce::types::*;

pub fn op_pending(name: &str) -> Operation {
    op_with_status(name, OperationStatus::Pending)
}

pub fn op_running(name: &str) -> Operation {
    op_with_status(name, OperationStatus::Running)
}

pub fn op_done(name: &str) -> Operation {
    op_with_status(name, OperationStatus::Done)
}

pub fn op_done_err(name: &str, code: &str) -> Operation {
    let mut op = op_with_status(name, OperationStatus::Done);
    op.error = Some(OperationErrorBody {
        errors: vec![OperationErrorDetail {
            code: code.to_string(),
            message: format!("{} in fake control plane", code),
        }],
    });
    op
}

fn op_with_status(name: &str, status: OperationStatus) -> Operation {
    Operation {
        name: name.to_string(),
        status,
        error: None,
        operation_type: None,
        target_link: None,
    }
}

pub fn staged_instance(name: &str, status: &str) -> Instance {
    Instance {
        name: name.to_string(),
        status: status.to_string(),
        machine_type: String::new(),
        zone: String::new(),
        self_link: String::new(),
        disks: Vec::new(),
        network_interfaces: Vec::new(),
    }
}

pub fn running_instance(name: &str) -> Instance {
    staged_instance(name, INSTANCE_RUNNING)
}

#[derive(Default)]
pub struct FakeCompute {
    project: String,
    operations: Mutex<HashMap<String, VecDeque<Operation>>>,
    op_polls: Mutex<HashMap<String, usize>>,
    instances: Mutex<HashMap<String, VecDeque<Instance>>>,
    /// Operations handed out per insert_instance call, in order. When the
    /// queue is empty, inserts succeed with a fresh DONE operation.
    insert_queue: Mutex<VecDeque<Operation>>,
    pub inserted_zones: Mutex<Vec<String>>,
    pub inserted_requests: Mutex<Vec<InstanceRequest>>,
    snapshots: Mutex<HashMap<String, Snapshot>>,
    pub snapshot_creates: Mutex<Vec<String>>,
    firewalls: Mutex<HashMap<String, FirewallRule>>,
    pub firewall_creates: Mutex<Vec<String>>,
    images: Mutex<HashMap<String, Image>>,
    /// One-shot lookup failures keyed by resource name (consumed on use).
    planted_errors: Mutex<HashMap<String, GceError>>,
    insert_count: Mutex<usize>,
}

impl FakeCompute {
    pub fn new(project: &str) -> Self {
        FakeCompute {
            project: project.to_string(),
            ..Default::default()
        }
    }

    pub fn script_operation(&self, name: &str, states: Vec<Operation>) {
        self.operations
            .lock()
            .unwrap()
            .insert(name.to_string(), states.into());
    }

    pub fn script_instance(&self, name: &str, states: Vec<Instance>) {
        self.instances
            .lock()
            .unwrap()
            .insert(name.to_string(), states.into());
    }

    /// Queues the operation returned by the next `insert_instance` call and
    /// scripts `get_operation` to replay its state.
    pub fn queue_insert(&self, op: Operation) {
        self.script_operation(&op.name, vec![op.clone()]);
        self.insert_queue.lock().unwrap().push_back(op);
    }

    pub fn plant_snapshot(&self, snapshot: Snapshot) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.name.clone(), snapshot);
    }

    pub fn plant_firewall(&self, rule: FirewallRule) {
        self.firewalls
            .lock()
            .unwrap()
            .insert(rule.name.clone(), rule);
    }

    pub fn plant_image(&self, family: &str, image: Image) {
        self.images
            .lock()
            .unwrap()
            .insert(family.to_string(), image);
    }

    pub fn plant_lookup_error(&self, name: &str, error: GceError) {
        self.planted_errors
            .lock()
            .unwrap()
            .insert(name.to_string(), error);
    }

    pub fn operation_polls(&self, name: &str) -> usize {
        self.op_polls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn take_planted_error(&self, name: &str) -> Option<GceError> {
        self.planted_errors.lock().unwrap().remove(name)
    }

    fn next_scripted<T: Clone>(map: &Mutex<HashMap<String, VecDeque<T>>>, name: &str) -> Option<T> {
        let mut map = map.lock().unwrap();
        let queue = map.get_mut(name)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Compute for FakeCompute {
    fn project(&self) -> &str {
        &self.project
    }

    async fn insert_instance(
        &self,
        zone: &str,
        request: &InstanceRequest,
    ) -> Result<Operation, GceError> {
        self.inserted_zones.lock().unwrap().push(zone.to_string());
        self.inserted_requests.lock().unwrap().push(request.clone());
        if let Some(op) = self.insert_queue.lock().unwrap().pop_front() {
            return Ok(op);
        }
        let mut count = self.insert_count.lock().unwrap();
        *count += 1;
        Ok(op_done(&format!("op-insert-{}", *count)))
    }

    async fn get_instance(&self, _zone: &str, name: &str) -> Result<Instance, GceError> {
        if let Some(err) = self.take_planted_error(name) {
            return Err(err);
        }
        match Self::next_scripted(&self.instances, name) {
            Some(instance) => Ok(instance),
            // Unscripted instances come up RUNNING immediately.
            None => Ok(running_instance(name)),
        }
    }

    async fn list_instances(&self, _zone: &str) -> Result<Vec<Instance>, GceError> {
        let instances = self.instances.lock().unwrap();
        Ok(instances
            .values()
            .filter_map(|q| q.back().cloned())
            .collect())
    }

    async fn get_operation(&self, _scope: &OpScope, name: &str) -> Result<Operation, GceError> {
        *self
            .op_polls
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += 1;
        match Self::next_scripted(&self.operations, name) {
            Some(op) => Ok(op),
            // Unscripted operations complete cleanly.
            None => Ok(op_done(name)),
        }
    }

    async fn create_snapshot(
        &self,
        _zone: &str,
        disk: &str,
        name: &str,
    ) -> Result<Operation, GceError> {
        self.snapshot_creates.lock().unwrap().push(name.to_string());
        self.plant_snapshot(Snapshot {
            name: name.to_string(),
            self_link: format!("https://fake/global/snapshots/{}", name),
            status: "READY".to_string(),
            source_disk: disk.to_string(),
        });
        Ok(op_done(&format!("op-snapshot-{}", name)))
    }

    async fn get_snapshot(&self, name: &str) -> Result<Snapshot, GceError> {
        if let Some(err) = self.take_planted_error(name) {
            return Err(err);
        }
        self.snapshots
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| GceError::NotFound(format!("snapshot {}", name)))
    }

    async fn insert_firewall(&self, rule: &FirewallRule) -> Result<Operation, GceError> {
        self.firewall_creates.lock().unwrap().push(rule.name.clone());
        let mut stored = rule.clone();
        stored.self_link = format!("https://fake/global/firewalls/{}", rule.name);
        self.plant_firewall(stored);
        Ok(op_done(&format!("op-firewall-{}", rule.name)))
    }

    async fn get_firewall(&self, name: &str) -> Result<FirewallRule, GceError> {
        if let Some(err) = self.take_planted_error(name) {
            return Err(err);
        }
        self.firewalls
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| GceError::NotFound(format!("firewall {}", name)))
    }

    async fn image_from_family(&self, _project: &str, family: &str) -> Result<Image, GceError> {
        self.images
            .lock()
            .unwrap()
            .get(family)
            .cloned()
            .ok_or_else(|| GceError::NotFound(format!("image family {}", family)))
    }
}
