//! Commands that fan out over many entities

use atelier_core::{AtelierError, EntityId, RequestParams, RequestResult, Result};
use serde_json::Value;

use super::{Command, CommandContext, CommandFlow};
use crate::composite::CompositeRequest;
use crate::session::{SessionHandle, SessionOptions};

/// Detach the underlay from every layer as one undo step
///
/// Commits one request per layer inside a session so each layer's geometry
/// refresh sees the previous one.
#[derive(Debug, Default)]
pub struct RemoveUnderlayFromAllLayers {
    session: Option<SessionHandle>,
    removed: Vec<EntityId>,
}

impl RemoveUnderlayFromAllLayers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Command for RemoveUnderlayFromAllLayers {
    fn on_execute(&mut self, ctx: &CommandContext, _event: Option<&Value>) -> Result<CommandFlow> {
        let layers: Vec<EntityId> = ctx.manager.with_document(|doc| {
            doc.layers()
                .filter(|layer| layer.underlay.is_some())
                .map(|layer| layer.id.clone())
                .collect()
        })?;

        let session = ctx
            .manager
            .start_session(SessionOptions::new(self.description()).category(self.category()))?;
        self.session = Some(session);

        for layer_id in layers {
            let request = ctx.manager.create_request(RequestParams::RemoveUnderlay {
                layer_id: layer_id.clone(),
            })?;
            ctx.manager.commit(request)?;
            self.removed.push(layer_id);
        }
        Ok(CommandFlow::Complete)
    }

    fn on_complete(&mut self, _ctx: &CommandContext) -> Result<RequestResult> {
        let session = self.session.take().ok_or(AtelierError::NoActiveCommand)?;
        session.commit()?;
        Ok(RequestResult::Entities(std::mem::take(&mut self.removed)))
    }

    fn on_cancel(&mut self, _ctx: &CommandContext) -> Result<()> {
        self.removed.clear();
        match self.session.take() {
            Some(session) => session.abort(),
            None => Ok(()),
        }
    }

    fn description(&self) -> String {
        "Remove underlay from all layers".to_string()
    }

    fn category(&self) -> &'static str {
        "underlay"
    }
}

/// Hide contents as a display toggle
///
/// Hides the given contents, or the selection when none are given. Display
/// toggles stay out of the undo history.
#[derive(Debug, Default)]
pub struct HideContentsCommand {
    targets: Vec<EntityId>,
    composite: Option<CompositeRequest>,
}

impl HideContentsCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: Vec<EntityId>) -> Self {
        Self {
            targets,
            composite: None,
        }
    }
}

impl Command for HideContentsCommand {
    fn on_execute(&mut self, ctx: &CommandContext, _event: Option<&Value>) -> Result<CommandFlow> {
        if self.targets.is_empty() {
            self.targets = ctx.selection.clone();
        }
        let contents: Vec<EntityId> = ctx.manager.with_document(|doc| {
            self.targets
                .iter()
                .filter(|id| doc.content(id).is_ok())
                .cloned()
                .collect()
        })?;

        let mut composite = CompositeRequest::new(self.description(), self.category());
        for entity_id in &contents {
            composite.append(ctx.manager.create_request(
                RequestParams::SetContentVisibility {
                    entity_id: entity_id.clone(),
                    visible: false,
                },
            )?)?;
        }
        self.targets = contents;
        self.composite = Some(composite);
        Ok(CommandFlow::Complete)
    }

    fn on_complete(&mut self, ctx: &CommandContext) -> Result<RequestResult> {
        let composite = self.composite.take().ok_or(AtelierError::NoActiveCommand)?;
        if !composite.is_empty() {
            ctx.manager.commit_unrecorded(composite)?;
        }
        Ok(RequestResult::Entities(self.targets.clone()))
    }

    fn on_cancel(&mut self, _ctx: &CommandContext) -> Result<()> {
        // nothing is applied before on_complete
        self.composite = None;
        Ok(())
    }

    fn can_undo_redo(&self) -> bool {
        false
    }

    fn description(&self) -> String {
        "Hide contents".to_string()
    }

    fn category(&self) -> &'static str {
        "display"
    }
}
