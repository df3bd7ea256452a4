//! Thin wrapper around the vendored `kube_runtime::events::EventRecorder`, translating the
//! engine's named events (spec §6B) into the recorder's `NewEvent` shape.
use k8s_openapi::api::core::v1::ObjectReference;
use kube_client::Client;
use kube_runtime::events::{EventRecorder, EventSource, EventType, NewEvent};

use crate::error::{Error, Result};
use platform_core::gvk::ResourceKey;

/// One of the fifteen named events the reconciler may emit against a managed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileEvent {
    Adopted,
    Rendered,
    DriftDetected,
    DriftCorrected,
    PatchApplied,
    PatchRejected,
    FieldsIgnored,
    SchemaMissing,
    SchemaRestored,
    Throttled,
    ThrashDetected,
    ReconcilePaused,
    ReconcileResumed,
    ObserveModeSkip,
    ReconcileFailed,
}

impl ReconcileEvent {
    fn reason(self) -> &'static str {
        match self {
            Self::Adopted => "Adopted",
            Self::Rendered => "Rendered",
            Self::DriftDetected => "DriftDetected",
            Self::DriftCorrected => "DriftCorrected",
            Self::PatchApplied => "PatchApplied",
            Self::PatchRejected => "PatchRejected",
            Self::FieldsIgnored => "FieldsIgnored",
            Self::SchemaMissing => "SchemaMissing",
            Self::SchemaRestored => "SchemaRestored",
            Self::Throttled => "Throttled",
            Self::ThrashDetected => "ThrashDetected",
            Self::ReconcilePaused => "ReconcilePaused",
            Self::ReconcileResumed => "ReconcileResumed",
            Self::ObserveModeSkip => "ObserveModeSkip",
            Self::ReconcileFailed => "ReconcileFailed",
        }
    }

    fn event_type(self) -> EventType {
        match self {
            Self::PatchRejected | Self::SchemaMissing | Self::Throttled | Self::ThrashDetected | Self::ReconcileFailed => {
                EventType::Warning
            }
            _ => EventType::Normal,
        }
    }
}

/// Publishes [`ReconcileEvent`]s against one managed object.
pub struct EventPublisher {
    recorder: EventRecorder,
}

impl EventPublisher {
    pub fn new(client: Client, controller_pod_name: &str, object_reference: ObjectReference) -> Self {
        let source = EventSource {
            controller_pod_name: controller_pod_name.try_into().expect("valid event source field"),
            controller_name: "virt-platform-operator".into(),
        };
        Self { recorder: EventRecorder::new(client, source, object_reference) }
    }

    pub async fn publish(&self, key: &ResourceKey, event: ReconcileEvent, note: Option<String>) -> Result<()> {
        self.recorder
            .publish(NewEvent {
                action: event.reason().into(),
                reason: event.reason().into(),
                note,
                event_type: event.event_type(),
                secondary_object: None,
            })
            .await
            .map_err(|e| Error::EventPublish(key.clone(), e))
    }
}
