// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{GenericCommand, RunRegistry};
use prometheus::{IntGauge, Registry};

#[test]
fn generic_command_reports_nothing() {
    let command = GenericCommand::with_program(RunRegistry::new(), "backup", "true");
    assert!(command.webhook_payloads().is_empty());
    assert!(command.metric_collectors().is_empty());

    let registry = Registry::new();
    assert_eq!(register_metrics(&command, &registry).unwrap(), 0);
    assert!(registry.gather().is_empty());
}

enum Check {
    Passed { snapshots: i64 },
    Failed,
}

impl Reporter for Check {
    fn webhook_payloads(&self) -> Vec<serde_json::Value> {
        match self {
            Check::Passed { snapshots } => vec![serde_json::json!({ "snapshots": snapshots })],
            Check::Failed => Vec::new(),
        }
    }

    fn metric_collectors(&self) -> Vec<Box<dyn Collector>> {
        let Check::Passed { snapshots } = self else {
            return Vec::new();
        };
        let gauge = IntGauge::new("restash_snapshots", "Snapshots in the repository").unwrap();
        gauge.set(*snapshots);
        vec![Box::new(gauge)]
    }
}

#[test]
fn overriding_reporter_exposes_payloads_and_metrics() {
    let check = Check::Passed { snapshots: 7 };
    assert_eq!(
        check.webhook_payloads(),
        vec![serde_json::json!({ "snapshots": 7 })]
    );

    let registry = Registry::new();
    assert_eq!(register_metrics(&check, &registry).unwrap(), 1);
    let families = registry.gather();
    assert_eq!(families.len(), 1);
    assert_eq!(families[0].get_name(), "restash_snapshots");
    assert_eq!(families[0].get_metric()[0].get_gauge().get_value(), 7.0);

    assert!(Check::Failed.webhook_payloads().is_empty());
}

#[test]
fn registering_twice_fails() {
    let check = Check::Passed { snapshots: 1 };
    let registry = Registry::new();
    register_metrics(&check, &registry).unwrap();
    assert!(register_metrics(&check, &registry).is_err());
}
