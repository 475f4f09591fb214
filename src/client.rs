//! Client facade: one tick drives networking, the map and every entity

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, info_span, Span};

use crate::action::{Action, ContinuousState};
use crate::hex::{HecsCoord, HexDirection};
use crate::map::{GridManager, MapSource, NetworkMapSource, TileRenderer};
use crate::net::{EntityManager, GameUi, NetworkRouter, Player, Transport};
use crate::util::time::{DEFAULT_ACTION_EXPIRATION_SECS, MOVE_DURATION_S, TURN_DURATION_S};

pub struct Client {
    router: NetworkRouter,
    grid: GridManager<NetworkMapSource>,
    action_expiration: Duration,
    span: Span,
}

impl Client {
    pub fn new(transport: Box<dyn Transport>, renderer: Box<dyn TileRenderer>) -> Self {
        let span = info_span!("client");
        let map_source = NetworkMapSource::new();
        let router = NetworkRouter::with_span(
            transport,
            map_source.clone(),
            info_span!(parent: &span, "router"),
        );
        let grid = GridManager::with_span(map_source, renderer, info_span!(parent: &span, "grid"));
        Self {
            router,
            grid,
            action_expiration: Duration::seconds(DEFAULT_ACTION_EXPIRATION_SECS),
            span,
        }
    }

    /// Horizon after which locally built actions fast-forward
    pub fn with_action_expiration(mut self, secs: i64) -> Self {
        self.action_expiration = Duration::seconds(secs);
        self
    }

    /// Create the game-scene collaborators. Messages received before
    /// this are held back and replayed on the next tick.
    pub fn attach_scene(&mut self) {
        let span = self.router.span().clone();
        self.router
            .attach_entities(EntityManager::with_span(info_span!(parent: &span, "entities")));
        self.router
            .attach_player(Player::with_span(info_span!(parent: &span, "player")));
        info!(parent: &self.span, "Game scene attached");
    }

    pub fn attach_ui(&mut self, ui: Box<dyn GameUi>) {
        self.router.attach_ui(ui);
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.router.pump(now);
        self.grid.tick();
        if let Some(player) = self.router.player_mut() {
            player.tick(now);
        }
        if let Some(entities) = self.router.entities_mut() {
            entities.tick(now);
        }
    }

    fn expiration(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.action_expiration
    }

    /// Resting location of an idle player, or None if it can't act yet
    fn idle_player_location(&self) -> Option<HecsCoord> {
        let player = self.router.player()?;
        if player.queue().is_busy() {
            debug!(parent: &self.span, "Player busy, input ignored");
            return None;
        }
        Some(player.queue().target_location())
    }

    /// Step one cell. Checked against the player's resting location, so
    /// an in-flight move can't be chained into a wall.
    pub fn try_move(&mut self, direction: HexDirection, now: DateTime<Utc>) -> bool {
        let Some(from) = self.idle_player_location() else {
            return false;
        };
        let to = from.neighbor(direction);
        if !self.grid.is_passable(from, to) {
            debug!(parent: &self.span, from = %from, to = %to, "Move blocked");
            return false;
        }
        let action = Action::translate(direction.offset(), MOVE_DURATION_S, self.expiration(now));
        self.router.submit_player_action(action);
        true
    }

    /// Turn in place by `degrees`, positive clockwise
    pub fn turn(&mut self, degrees: f32, now: DateTime<Utc>) -> bool {
        if self.idle_player_location().is_none() {
            return false;
        }
        let action = Action::rotate(degrees, TURN_DURATION_S, self.expiration(now));
        self.router.submit_player_action(action);
        true
    }

    /// Nothing buffered and no entity mid-action
    pub fn is_idle(&self) -> bool {
        self.router.pending_len() == 0
            && self.router.player().map_or(true, |p| !p.queue().is_busy())
            && self.router.entities().map_or(true, EntityManager::is_idle)
    }

    pub fn player_state(&self) -> Option<ContinuousState> {
        self.router.player().map(|p| p.queue().continuous_state())
    }

    pub fn entity_states(&self) -> Vec<(i32, ContinuousState)> {
        self.router
            .entities()
            .map(EntityManager::snapshot)
            .unwrap_or_default()
    }

    /// Raw last map update plus what every entity looks like right now
    pub fn bug_report(&self) -> Value {
        let entities: Vec<Value> = self
            .entity_states()
            .into_iter()
            .map(|(id, state)| json!({ "id": id, "state": state }))
            .collect();
        json!({
            "map_update": self.grid.source().raw_map_update(),
            "player_id": self.router.player_id(),
            "player": self.player_state(),
            "entities": entities,
        })
    }

    pub fn router(&self) -> &NetworkRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut NetworkRouter {
        &mut self.router
    }

    pub fn grid(&self) -> &GridManager<NetworkMapSource> {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexBoundary, HexCell};
    use crate::map::{GridState, MapUpdate, NullRenderer, TileInfo};
    use crate::net::{ChannelTransport, ServerEndpoint};
    use crate::protocol::{ActorSnapshot, MessageFromClient, MessageToClient, StateSync};

    fn ground_map(rows: i32, cols: i32, wall: Option<(HecsCoord, HexDirection)>) -> MapUpdate {
        let mut tiles = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let coord = HecsCoord::from_offset(row, col);
                let mut boundary = HexBoundary::EMPTY;
                if let Some((at, direction)) = wall {
                    if at == coord {
                        boundary.set_edge(direction);
                    }
                }
                tiles.push(TileInfo {
                    asset_id: 3,
                    cell: HexCell::new(coord, boundary, 0.0, 0),
                    rotation_degrees: 0,
                });
            }
        }
        MapUpdate {
            rows,
            cols,
            tiles,
            ..Default::default()
        }
    }

    fn started(map: MapUpdate, now: DateTime<Utc>) -> (Client, ServerEndpoint) {
        let (transport, server) = ChannelTransport::pair();
        let mut client = Client::new(Box::new(transport), Box::new(NullRenderer::default()));
        client.attach_scene();
        server
            .to_client
            .try_send(MessageToClient::MapUpdate { map_update: map })
            .unwrap();
        server
            .to_client
            .try_send(MessageToClient::StateSync {
                state: StateSync {
                    population: 1,
                    player_id: 5,
                    actors: vec![ActorSnapshot {
                        actor_id: 5,
                        asset_id: 0,
                        location: HecsCoord::ORIGIN,
                        rotation_degrees: 0.0,
                    }],
                },
            })
            .unwrap();
        client.tick(now);
        (client, server)
    }

    #[test]
    fn move_is_predicted_and_sent() {
        let now = Utc::now();
        let (mut client, mut server) = started(ground_map(4, 4, None), now);
        assert_eq!(client.grid().state(), GridState::Populated);

        assert!(client.try_move(HexDirection::Right, now));
        let MessageFromClient::Actions { actions } = server.from_client.try_recv().unwrap() else {
            panic!("expected actions");
        };
        assert_eq!(actions[0].id, 5);
        assert_eq!(actions[0].displacement, HecsCoord::new(0, 0, 1));

        // Busy until the step plays out.
        assert!(!client.try_move(HexDirection::Right, now));
        client.tick(now + Duration::milliseconds(100));
        client.tick(now + Duration::milliseconds(400));
        assert!(client.is_idle());
        let player = client.router().player().unwrap();
        assert_eq!(player.queue().target_location(), HecsCoord::new(0, 0, 1));
    }

    #[test]
    fn walls_and_map_edges_block_moves() {
        let now = Utc::now();
        let wall = Some((HecsCoord::ORIGIN, HexDirection::Right));
        let (mut client, mut server) = started(ground_map(4, 4, wall), now);

        assert!(!client.try_move(HexDirection::Right, now));
        assert!(!client.try_move(HexDirection::Left, now));
        assert!(server.from_client.try_recv().is_err());
        assert!(client.is_idle());
    }

    #[test]
    fn cannot_step_off_the_bottom_of_an_odd_map() {
        let now = Utc::now();
        let (mut client, server) = started(ground_map(3, 3, None), now);
        let bottom = HecsCoord::from_offset(2, 1);
        server
            .to_client
            .try_send(MessageToClient::StateSync {
                state: StateSync {
                    population: 1,
                    player_id: 5,
                    actors: vec![ActorSnapshot {
                        actor_id: 5,
                        asset_id: 0,
                        location: bottom,
                        rotation_degrees: 0.0,
                    }],
                },
            })
            .unwrap();
        client.tick(now);
        assert_eq!(client.router().player().unwrap().queue().target_location(), bottom);

        assert!(!client.try_move(HexDirection::DownRight, now));
        assert!(!client.try_move(HexDirection::DownLeft, now));
        assert!(client.try_move(HexDirection::Right, now));
    }

    #[test]
    fn no_moves_before_map_arrives() {
        let now = Utc::now();
        let (transport, _server) = ChannelTransport::pair();
        let mut client = Client::new(Box::new(transport), Box::new(NullRenderer::default()));
        assert!(!client.try_move(HexDirection::Right, now));
        client.attach_scene();
        client.tick(now);
        assert!(!client.try_move(HexDirection::Right, now));
    }

    #[test]
    fn turn_rotates_heading() {
        let now = Utc::now();
        let (mut client, _server) = started(ground_map(2, 2, None), now);
        assert!(client.turn(60.0, now));
        assert!(!client.turn(60.0, now));
        client.tick(now);
        client.tick(now + Duration::milliseconds(300));
        let player = client.router().player().unwrap();
        assert_eq!(player.queue().target_heading(), 60.0);
    }

    #[test]
    fn bug_report_has_map_and_entities() {
        let now = Utc::now();
        let (client, _server) = started(ground_map(2, 3, None), now);
        let report = client.bug_report();
        assert_eq!(report["map_update"]["rows"], 2);
        assert_eq!(report["map_update"]["cols"], 3);
        assert_eq!(report["player_id"], 5);
        assert!(report["entities"].as_array().unwrap().is_empty());
    }
}
