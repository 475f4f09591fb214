//! Inbound dispatch and outbound action packets

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, info_span, trace, warn, Span};

use crate::action::{Action, DiscreteState};
use crate::map::NetworkMapSource;
use crate::protocol::{
    MessageFromClient, MessageToClient, ObjectiveMessage, StateSync, TurnState, WireAction,
};

use super::entities::{EntityManager, Player, Validation};
use super::transport::Transport;

/// UI collaborator. Every hook is optional.
pub trait GameUi {
    fn on_turn_state(&mut self, _turn_state: &TurnState) {}
    fn on_objectives(&mut self, _objectives: &[ObjectiveMessage]) {}
    fn on_tutorial_response(&mut self, _response: &Value) {}
    fn on_room_management(&mut self, _response: &Value) {}
    fn on_auth_confirmation(&mut self, _confirmation: &Value) {}
    fn on_user_info(&mut self, _info: &Value) {}
    fn on_menu_options(&mut self, _options: &Value) {}
    fn on_live_feedback(&mut self, _feedback: &Value) {}
}

/// Routes server messages to the collaborators that own them.
///
/// Until both the entity manager and the player are attached, every
/// message outside the early-processable set is held back in arrival
/// order. The backlog is replayed before any newer message is handled.
pub struct NetworkRouter {
    transport: Box<dyn Transport>,
    map_sink: NetworkMapSource,
    ui: Option<Box<dyn GameUi>>,
    entities: Option<EntityManager>,
    player: Option<Player>,
    pending: VecDeque<MessageToClient>,
    span: Span,
}

impl NetworkRouter {
    pub fn new(transport: Box<dyn Transport>, map_sink: NetworkMapSource) -> Self {
        Self::with_span(transport, map_sink, info_span!("router"))
    }

    pub fn with_span(transport: Box<dyn Transport>, map_sink: NetworkMapSource, span: Span) -> Self {
        Self {
            transport,
            map_sink,
            ui: None,
            entities: None,
            player: None,
            pending: VecDeque::new(),
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn attach_ui(&mut self, ui: Box<dyn GameUi>) {
        self.ui = Some(ui);
    }

    pub fn attach_entities(&mut self, entities: EntityManager) {
        self.entities = Some(entities);
    }

    pub fn attach_player(&mut self, player: Player) {
        self.player = Some(player);
    }

    /// All required collaborators are attached
    pub fn is_initialized(&self) -> bool {
        self.entities.is_some() && self.player.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn entities(&self) -> Option<&EntityManager> {
        self.entities.as_ref()
    }

    pub fn entities_mut(&mut self) -> Option<&mut EntityManager> {
        self.entities.as_mut()
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    pub fn player_id(&self) -> Option<i32> {
        self.player.as_ref().and_then(|p| p.id())
    }

    pub fn map_sink(&self) -> &NetworkMapSource {
        &self.map_sink
    }

    /// Replay any backlog, then drain everything the transport has.
    pub fn pump(&mut self, now: DateTime<Utc>) {
        if self.is_initialized() {
            self.replay_pending(now);
        }
        while let Some(message) = self.transport.try_recv() {
            self.route(message, now);
        }
    }

    /// Handle one inbound message, or hold it back if the game isn't ready.
    pub fn route(&mut self, message: MessageToClient, now: DateTime<Utc>) {
        if message.is_early_processable() {
            self.dispatch(message, now);
            return;
        }
        if !self.is_initialized() {
            trace!(parent: &self.span, message_type = message.message_type(), "Buffering message");
            self.pending.push_back(message);
            return;
        }
        self.replay_pending(now);
        self.dispatch(message, now);
    }

    fn replay_pending(&mut self, now: DateTime<Utc>) {
        if self.pending.is_empty() {
            return;
        }
        info!(parent: &self.span, count = self.pending.len(), "Replaying buffered messages");
        while let Some(message) = self.pending.pop_front() {
            self.dispatch(message, now);
        }
    }

    fn dispatch(&mut self, message: MessageToClient, now: DateTime<Utc>) {
        trace!(parent: &self.span, message_type = message.message_type(), "Dispatching");
        match message {
            MessageToClient::Actions { actions } => self.handle_actions(actions),
            MessageToClient::MapUpdate { map_update } => {
                self.map_sink.receive_map_update(map_update)
            }
            MessageToClient::StateSync { state } => self.handle_state_sync(state, now),
            MessageToClient::PropUpdate { prop_update } => {
                if let Some(entities) = self.entities.as_mut() {
                    entities.reset_props(&prop_update.props, now);
                }
            }
            MessageToClient::PropSpawn { prop_spawn } => {
                if let Some(entities) = self.entities.as_mut() {
                    entities.spawn_prop(&prop_spawn, now);
                }
            }
            MessageToClient::PropDespawn { prop_despawn } => {
                if let Some(entities) = self.entities.as_mut() {
                    for id in prop_despawn {
                        entities.despawn(id, now);
                    }
                }
            }
            MessageToClient::TurnState { turn_state } => {
                self.with_ui("TURN_STATE", |ui| ui.on_turn_state(&turn_state))
            }
            MessageToClient::Objective { objectives } => {
                self.with_ui("OBJECTIVE", |ui| ui.on_objectives(&objectives))
            }
            MessageToClient::TutorialResponse { tutorial_response } => self
                .with_ui("TUTORIAL_RESPONSE", |ui| {
                    ui.on_tutorial_response(&tutorial_response)
                }),
            MessageToClient::RoomManagement {
                room_management_response,
            } => self.with_ui("ROOM_MANAGEMENT", |ui| {
                ui.on_room_management(&room_management_response)
            }),
            MessageToClient::GoogleAuthConfirmation {
                google_auth_confirmation,
            } => self.with_ui("GOOGLE_AUTH_CONFIRMATION", |ui| {
                ui.on_auth_confirmation(&google_auth_confirmation)
            }),
            MessageToClient::UserInfo { user_info } => {
                self.with_ui("USER_INFO", |ui| ui.on_user_info(&user_info))
            }
            MessageToClient::MenuOptions { menu_options } => {
                self.with_ui("MENU_OPTIONS", |ui| ui.on_menu_options(&menu_options))
            }
            MessageToClient::LiveFeedback { live_feedback } => {
                self.with_ui("LIVE_FEEDBACK", |ui| ui.on_live_feedback(&live_feedback))
            }
            MessageToClient::Ping => self.send(MessageFromClient::Pong {
                ping_receive_time: now,
            }),
            MessageToClient::Unknown => {
                warn!(parent: &self.span, "Unknown message type ignored");
            }
        }
    }

    fn with_ui(&mut self, message_type: &'static str, f: impl FnOnce(&mut dyn GameUi)) {
        match self.ui.as_mut() {
            Some(ui) => f(ui.as_mut()),
            None => debug!(parent: &self.span, message_type, "No UI attached, message dropped"),
        }
    }

    fn handle_actions(&mut self, actions: Vec<WireAction>) {
        let player_id = self.player_id();
        let mut diverged = false;
        for wire in actions {
            let action = wire.decode();
            if Some(wire.id) == player_id {
                if let Some(player) = self.player.as_mut() {
                    diverged |= player.validate_from_network(action) == Validation::Diverged;
                }
            } else if let Some(entities) = self.entities.as_mut() {
                entities.add_action(wire.id, action);
            }
        }
        if diverged {
            info!(parent: &self.span, "Requesting state sync after divergence");
            self.send(MessageFromClient::StateSyncRequest);
        }
    }

    /// Rebuild every actor and re-seat the player from an authoritative snapshot
    fn handle_state_sync(&mut self, state: StateSync, now: DateTime<Utc>) {
        let (Some(entities), Some(player)) = (self.entities.as_mut(), self.player.as_mut()) else {
            return;
        };

        entities.clear_actors();
        for actor in &state.actors {
            if actor.actor_id == state.player_id {
                continue;
            }
            entities.spawn_actor(actor, now);
        }

        if state.player_id < 0 {
            player.set_id(None);
        } else {
            player.set_id(Some(state.player_id));
            match state.player() {
                Some(me) => {
                    player.teleport(DiscreteState::at(me.location, me.rotation_degrees), now)
                }
                None => warn!(
                    parent: &self.span,
                    player_id = state.player_id,
                    "State sync has no entry for local player"
                ),
            }
        }

        info!(
            parent: &self.span,
            actors = state.actors.len(),
            player_id = state.player_id,
            "State sync applied"
        );
    }

    /// Send an action on behalf of the local player. Returns whether it
    /// was handed to the transport.
    pub fn transmit_action(&mut self, action: &Action) -> bool {
        let Some(id) = self.player_id() else {
            debug!(parent: &self.span, action = action.name(), "No player id yet, action kept local");
            return false;
        };
        let Ok(wire) = action.packet(id) else {
            return false;
        };
        self.send(MessageFromClient::Actions {
            actions: vec![wire],
        });
        true
    }

    /// Play an action locally right away and send it to the server.
    pub fn submit_player_action(&mut self, action: Action) -> bool {
        match self.player.as_mut() {
            Some(player) => player.predict(action.clone()),
            None => {
                warn!(parent: &self.span, "No player attached, action ignored");
                return false;
            }
        }
        self.transmit_action(&action)
    }

    fn send(&mut self, message: MessageFromClient) {
        if let Err(e) = self.transport.send(message) {
            warn!(parent: &self.span, error = %e, "Failed to send message");
        }
    }
}
