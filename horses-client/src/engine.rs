//! Turn synchronizer engine.
//!
//! Drives the pure [`Session`] state machine from smart-horses-core: every
//! trigger becomes an [`Event`], and the returned [`Action`]s are executed
//! here (remote calls, the minimum display timer, highlight tasks).

use crate::service::{GameService, ServiceError};
use smart_horses_core::{Action, Event, GameEvent, Rejected, RequestTag, Session, SessionView};
use smart_horses_types::{Coord, Difficulty, HealthStatus, MachineMove, Side};
use std::collections::VecDeque;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the game event channel.
const EVENT_CAPACITY: usize = 64;

/// Engine errors for calls that return data to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session refused the call.
    #[error(transparent)]
    Rejected(#[from] Rejected),

    /// The game service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Shortest time a speculative board stays up.
    pub min_move_display: Duration,
    /// Delay before an opponent move is highlighted.
    pub highlight_delay: Duration,
    /// How long an opponent highlight stays.
    pub highlight_hold: Duration,
    /// Side the local player controls.
    pub local_side: Side,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_move_display: Duration::from_millis(1000),
            highlight_delay: Duration::from_millis(400),
            highlight_hold: Duration::from_millis(1000),
            local_side: Side::Black,
        }
    }
}

impl EngineConfig {
    /// Create config with default timings and the local player on black.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum speculative display time.
    pub fn with_min_move_display(mut self, duration: Duration) -> Self {
        self.min_move_display = duration;
        self
    }

    /// Set the delay before an opponent highlight.
    pub fn with_highlight_delay(mut self, duration: Duration) -> Self {
        self.highlight_delay = duration;
        self
    }

    /// Set how long an opponent highlight stays.
    pub fn with_highlight_hold(mut self, duration: Duration) -> Self {
        self.highlight_hold = duration;
        self
    }

    /// Set the side the local player controls.
    pub fn with_local_side(mut self, side: Side) -> Self {
        self.local_side = side;
        self
    }
}

/// Turn synchronizer: optimistic local moves reconciled with the game authority.
///
/// Cheap to clone; clones drive the same session.
pub struct TurnSynchronizer<S: GameService> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    service: S,
    config: EngineConfig,
    /// Never held across an await.
    session: Mutex<Session>,
    view_tx: watch::Sender<SessionView>,
    events_tx: broadcast::Sender<GameEvent>,
    highlights: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: GameService> Clone for TurnSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: GameService + 'static> TurnSynchronizer<S> {
    /// Create an engine with no game on the board.
    pub fn new(service: S, config: EngineConfig) -> Self {
        let session = Session::new(config.local_side);
        let (view_tx, _) = watch::channel(session.view());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                service,
                config,
                session: Mutex::new(session),
                view_tx,
                events_tx,
                highlights: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Current session snapshot.
    pub fn view(&self) -> SessionView {
        self.session().view()
    }

    /// Watch every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.inner.view_tx.subscribe()
    }

    /// Receive game events emitted from now on.
    pub fn events(&self) -> broadcast::Receiver<GameEvent> {
        self.inner.events_tx.subscribe()
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Underlying game service.
    pub fn service(&self) -> &S {
        &self.inner.service
    }

    /// Start a new game, discarding the current one.
    ///
    /// Resolves once the game is created or creation failed; a failure is
    /// reported through `last_error`.
    pub async fn start_game(&self, difficulty: Difficulty) -> Result<(), Rejected> {
        let actions =
            self.apply_checked(Event::StartRequested { difficulty }, Session::check_start)?;
        info!(%difficulty, "starting new game");
        self.drive(actions).await;
        Ok(())
    }

    /// Play `destination` for the local side.
    ///
    /// The projected board is published at once; the call resolves after the
    /// authority answered and the minimum display time passed. A failure rolls
    /// the board back and is reported through `last_error`.
    pub async fn submit_local_move(&self, destination: Coord) -> Result<(), Rejected> {
        let actions = self.apply_checked(Event::MoveRequested { destination }, |session| {
            session.check_move(destination)
        })?;
        debug!(%destination, "submitting local move");
        self.drive(actions).await;
        Ok(())
    }

    /// Reload the legal-move cache for the current board.
    pub async fn refresh_legal_moves(&self) {
        let actions = self.apply(Event::RefreshRequested);
        self.drive(actions).await;
    }

    /// Drop the current game and abandon all outstanding work.
    pub fn reset(&self) {
        info!("resetting session");
        let leftover = self.apply(Event::ResetRequested);
        debug_assert!(leftover.is_empty());
    }

    /// Ask the opponent engine what it would play on the current board.
    ///
    /// Does not change the session.
    pub async fn fetch_opponent_move(&self) -> Result<MachineMove, EngineError> {
        let board = {
            let session = self.session();
            let board = session.board().ok_or(Rejected::NoGame)?;
            if board.game_over {
                return Err(Rejected::GameOver.into());
            }
            board.clone()
        };
        let reply = self.inner.service.fetch_opponent_move(&board).await?;
        debug!(square = %reply.square, evaluation = ?reply.evaluation, "opponent move probe");
        Ok(reply)
    }

    /// Probe the game server.
    pub async fn health(&self) -> Result<HealthStatus, ServiceError> {
        self.inner.service.health().await
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed `event` to the session, publish the new view and run the actions
    /// that need no I/O. Returns the remote calls still to make.
    fn apply(&self, event: Event) -> Vec<Action> {
        let actions = {
            let mut session = self.session();
            self.transition(&mut session, event)
        };
        self.run_local(actions)
    }

    /// Like [`apply`](Self::apply), but only if `check` passes on the same
    /// locked session the event is fed to.
    fn apply_checked(
        &self,
        event: Event,
        check: impl FnOnce(&Session) -> Result<(), Rejected>,
    ) -> Result<Vec<Action>, Rejected> {
        let actions = {
            let mut session = self.session();
            check(&session)?;
            self.transition(&mut session, event)
        };
        Ok(self.run_local(actions))
    }

    fn transition(&self, session: &mut Session, event: Event) -> Vec<Action> {
        let (next, actions) = mem::take(session).on_event(event);
        *session = next;
        self.inner.view_tx.send_replace(session.view());
        actions
    }

    fn run_local(&self, actions: Vec<Action>) -> Vec<Action> {
        let mut remote = Vec::new();
        for action in actions {
            match action {
                Action::EmitEvent(event) => {
                    // No subscribers is fine.
                    let _ = self.inner.events_tx.send(event);
                }
                Action::CancelHighlights => self.cancel_highlights(),
                Action::ScheduleHighlight { sequence, square } => {
                    self.schedule_highlight(sequence, square)
                }
                other => remote.push(other),
            }
        }
        remote
    }

    /// Run remote calls until the session asks for no more.
    async fn drive(&self, actions: Vec<Action>) {
        let mut queue: VecDeque<Action> = actions.into();

        while let Some(action) = queue.pop_front() {
            let follow_up = match action {
                Action::CreateGame { tag, difficulty } => {
                    let guard = AbandonGuard::new(self, tag);
                    let result = self.inner.service.create_game(difficulty).await;
                    guard.disarm();
                    if let Err(e) = &result {
                        warn!(error = %e, "failed to create game");
                    }
                    self.apply(Event::GameCreated {
                        tag,
                        difficulty,
                        result: result.map_err(|e| e.user_message()),
                    })
                }
                Action::SubmitMove {
                    tag,
                    before,
                    destination,
                } => {
                    let guard = AbandonGuard::new(self, tag);
                    let (result, ()) = tokio::join!(
                        self.inner.service.submit_move(&before, destination),
                        tokio::time::sleep(self.inner.config.min_move_display),
                    );
                    guard.disarm();
                    if let Err(e) = &result {
                        warn!(error = %e, %destination, "move submission failed");
                    }
                    self.apply(Event::MoveResolved {
                        tag,
                        result: result.map_err(|e| e.user_message()),
                    })
                }
                Action::FetchLegalMoves { tag, board } => {
                    let result = self
                        .inner
                        .service
                        .fetch_legal_moves(&board, self.inner.config.local_side)
                        .await;
                    if let Err(e) = &result {
                        warn!(error = %e, "failed to load legal moves");
                    }
                    self.apply(Event::LegalMovesResolved {
                        tag,
                        result: result.map_err(|e| e.user_message()),
                    })
                }
                other => {
                    debug!(?other, "unexpected action in remote queue");
                    vec![]
                }
            };
            queue.extend(follow_up);
        }
    }

    fn schedule_highlight(&self, sequence: u64, square: Coord) {
        let engine = self.clone();
        let delay = self.inner.config.highlight_delay;
        let hold = self.inner.config.highlight_hold;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.apply(Event::HighlightShown { sequence, square });
            tokio::time::sleep(hold).await;
            engine.apply(Event::HighlightExpired { sequence, square });
        });

        let mut highlights = self
            .inner
            .highlights
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        highlights.retain(|task| !task.is_finished());
        highlights.push(handle);
    }

    fn cancel_highlights(&self) {
        let mut highlights = self
            .inner
            .highlights
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for task in highlights.drain(..) {
            task.abort();
        }
    }
}

/// Reports a request as abandoned if its driving future is dropped before
/// the reply is applied.
struct AbandonGuard<'a, S: GameService + 'static> {
    engine: &'a TurnSynchronizer<S>,
    tag: Option<RequestTag>,
}

impl<'a, S: GameService + 'static> AbandonGuard<'a, S> {
    fn new(engine: &'a TurnSynchronizer<S>, tag: RequestTag) -> Self {
        Self {
            engine,
            tag: Some(tag),
        }
    }

    fn disarm(mut self) {
        self.tag = None;
    }
}

impl<S: GameService + 'static> Drop for AbandonGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(tag) = self.tag.take() {
            debug!(?tag, "request abandoned");
            let leftover = self.engine.apply(Event::RequestAbandoned { tag });
            if !leftover.is_empty() {
                debug!(count = leftover.len(), "follow-up calls skipped after abandonment");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MockCall, MockGameService};
    use serde_json::json;
    use smart_horses_types::{BoardState, LegalMoves, MoveOutcome, Winner};
    use tokio::time::Instant;

    fn sq(row: i64, col: i64) -> Coord {
        Coord::new(row, col).unwrap()
    }

    fn opening(current: &str) -> BoardState {
        serde_json::from_value(json!({
            "board": {"2,3": 3, "4,1": 1, "5,5": 4},
            "white_knight": [7, 4],
            "black_knight": [0, 2],
            "white_score": 0,
            "black_score": 0,
            "current_player": current,
            "game_over": false,
            "winner": null
        }))
        .unwrap()
    }

    /// Board after black took [2,3] (+3) and white answered on [5,5] (+4).
    fn after_exchange() -> BoardState {
        serde_json::from_value(json!({
            "board": {"0,2": "destroyed", "7,4": "destroyed", "4,1": 1},
            "white_knight": [5, 5],
            "black_knight": [2, 3],
            "white_score": 4,
            "black_score": 3,
            "current_player": "black",
            "game_over": false,
            "winner": null
        }))
        .unwrap()
    }

    fn engine_with(mock: &MockGameService) -> TurnSynchronizer<MockGameService> {
        TurnSynchronizer::new(mock.clone(), EngineConfig::default())
    }

    async fn started(mock: &MockGameService) -> TurnSynchronizer<MockGameService> {
        mock.queue_game(opening("black"));
        mock.queue_legal_moves(LegalMoves::Moves(vec![sq(2, 3), sq(4, 1)]));
        let engine = engine_with(mock);
        engine.start_game(Difficulty::Beginner).await.unwrap();
        engine
    }

    // ===========================================
    // Config Tests
    // ===========================================

    #[test]
    fn config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.min_move_display, Duration::from_millis(1000));
        assert_eq!(config.highlight_delay, Duration::from_millis(400));
        assert_eq!(config.highlight_hold, Duration::from_millis(1000));
        assert_eq!(config.local_side, Side::Black);
    }

    #[test]
    fn config_builder() {
        let config = EngineConfig::new()
            .with_min_move_display(Duration::from_millis(10))
            .with_highlight_delay(Duration::from_millis(20))
            .with_highlight_hold(Duration::from_millis(30))
            .with_local_side(Side::White);
        assert_eq!(config.min_move_display, Duration::from_millis(10));
        assert_eq!(config.highlight_delay, Duration::from_millis(20));
        assert_eq!(config.highlight_hold, Duration::from_millis(30));
        assert_eq!(config.local_side, Side::White);
    }

    // ===========================================
    // Game Lifecycle Tests
    // ===========================================

    #[tokio::test]
    async fn start_game_installs_board_and_moves() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;

        let view = engine.view();
        assert_eq!(view.board, Some(opening("black")));
        assert_eq!(view.legal_moves, vec![sq(2, 3), sq(4, 1)]);
        assert_eq!(view.difficulty, Some(Difficulty::Beginner));
        assert!(!view.pending);
        assert_eq!(
            mock.calls()[..2],
            [
                MockCall::CreateGame(Difficulty::Beginner),
                MockCall::FetchLegalMoves {
                    board: opening("black"),
                    side: Side::Black,
                },
            ]
        );
    }

    #[tokio::test]
    async fn start_failure_sets_error() {
        let mock = MockGameService::new();
        mock.fail_next_create(ServiceError::unreachable());
        let engine = engine_with(&mock);

        engine.start_game(Difficulty::Expert).await.unwrap();

        let view = engine.view();
        assert!(view.board.is_none());
        assert!(!view.pending);
        assert_eq!(
            view.last_error.as_deref(),
            Some(crate::service::CONNECT_FAILURE_MESSAGE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_start_is_rejected() {
        let mock = MockGameService::new();
        mock.set_latency(Duration::from_millis(100));
        mock.queue_game(opening("white"));
        let engine = engine_with(&mock);

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.start_game(Difficulty::Beginner).await }
        });
        tokio::task::yield_now().await;

        assert_eq!(
            engine.start_game(Difficulty::Amateur).await,
            Err(Rejected::CreationPending)
        );
        first.await.unwrap().unwrap();
        assert_eq!(engine.view().difficulty, Some(Difficulty::Beginner));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_starts_from_clones_get_one_winner() {
        let mock = MockGameService::new();
        mock.set_latency(Duration::from_millis(500));
        mock.queue_game(opening("white"));
        let engine = engine_with(&mock);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.start_game(Difficulty::Beginner).await })
            })
            .collect();
        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == Rejected::CreationPending));
        let creates = mock
            .calls()
            .into_iter()
            .filter(|call| matches!(call, MockCall::CreateGame(_)))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn moves_are_rejected_before_a_game() {
        let engine = engine_with(&MockGameService::new());
        assert_eq!(
            engine.submit_local_move(sq(2, 3)).await,
            Err(Rejected::NoGame)
        );
    }

    // ===========================================
    // Move Synchronization Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn full_turn_with_opponent_highlight() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        let mut events = engine.events();
        let mut views = engine.subscribe();

        mock.queue_move(MoveOutcome {
            board: after_exchange(),
            opponent_move: Some(sq(5, 5)),
        });
        mock.queue_legal_moves(LegalMoves::Moves(vec![sq(4, 1)]));

        let submit = tokio::spawn({
            let engine = engine.clone();
            async move { engine.submit_local_move(sq(2, 3)).await }
        });

        // The projection is published before the authority answers.
        views.changed().await.unwrap();
        let speculative = views.borrow_and_update().clone();
        let projected = speculative.board.as_ref().unwrap();
        assert!(speculative.speculative);
        assert!(speculative.pending);
        assert_eq!(projected.black_score, 3);
        assert_eq!(projected.current_player, Side::White);
        assert_eq!(speculative.highlight, Some(sq(2, 3)));

        submit.await.unwrap().unwrap();

        let view = engine.view();
        assert_eq!(view.board, Some(after_exchange()));
        assert!(!view.speculative);
        assert!(!view.pending);
        assert_eq!(view.legal_moves, vec![sq(4, 1)]);

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(engine.view().highlight, Some(sq(5, 5)));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(engine.view().highlight, None);

        assert_eq!(
            events.recv().await.unwrap(),
            GameEvent::PieceMoved {
                side: Side::Black,
                square: sq(2, 3)
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            GameEvent::PieceMoved {
                side: Side::White,
                square: sq(5, 5)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pending_lasts_at_least_min_display() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        mock.set_latency(Duration::from_millis(10));
        mock.queue_move(MoveOutcome {
            board: after_exchange(),
            opponent_move: None,
        });
        mock.queue_legal_moves(LegalMoves::Moves(vec![sq(4, 1)]));

        let started_at = Instant::now();
        let submit = tokio::spawn({
            let engine = engine.clone();
            async move { engine.submit_local_move(sq(2, 3)).await }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(engine.view().pending, "still pending after the reply arrived");

        submit.await.unwrap().unwrap();
        assert!(started_at.elapsed() >= Duration::from_millis(1000));
        assert!(!engine.view().pending);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_move_rolls_back() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        let mut events = engine.events();
        mock.fail_next_move(ServiceError::Rejected("Invalid move".into()));

        engine.submit_local_move(sq(2, 3)).await.unwrap();

        let view = engine.view();
        assert_eq!(view.board, Some(opening("black")));
        assert_eq!(view.legal_moves, vec![sq(2, 3), sq(4, 1)]);
        assert_eq!(view.last_error.as_deref(), Some("Invalid move"));
        assert_eq!(view.highlight, None);
        assert!(!view.pending);

        let _local = events.recv().await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            GameEvent::MoveFailed {
                reason: "Invalid move".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submission_clears_pending() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        mock.set_latency(Duration::from_secs(60));

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            engine.submit_local_move(sq(2, 3)),
        )
        .await;
        assert!(result.is_err(), "submission should still be in flight");

        let view = engine.view();
        assert!(!view.pending);
        assert_eq!(view.board, Some(opening("black")));
        assert_eq!(view.last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn illegal_destination_is_a_no_op() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        let calls_before = mock.calls().len();

        assert_eq!(
            engine.submit_local_move(sq(5, 5)).await,
            Err(Rejected::IllegalDestination(sq(5, 5)))
        );
        assert_eq!(mock.calls().len(), calls_before);
        assert_eq!(engine.view().board, Some(opening("black")));
    }

    #[tokio::test(start_paused = true)]
    async fn game_over_stops_play() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        let mut finished = after_exchange();
        finished.game_over = true;
        finished.winner = Some(Winner::White);
        mock.queue_move(MoveOutcome {
            board: finished,
            opponent_move: None,
        });

        engine.submit_local_move(sq(2, 3)).await.unwrap();
        let calls = mock.calls().len();

        assert_eq!(
            engine.submit_local_move(sq(4, 1)).await,
            Err(Rejected::GameOver)
        );
        engine.refresh_legal_moves().await;
        assert_eq!(mock.calls().len(), calls, "no remote calls after game over");
        assert!(matches!(
            engine.fetch_opponent_move().await,
            Err(EngineError::Rejected(Rejected::GameOver))
        ));
    }

    // ===========================================
    // Legal-Move Cache Tests
    // ===========================================

    #[tokio::test]
    async fn forced_pass_installs_penalised_board() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;

        let mut penalised = opening("black");
        penalised.black_score = 5;
        mock.queue_legal_moves(LegalMoves::ForcedPass {
            board: penalised.clone(),
            opponent_move: None,
        });
        mock.queue_legal_moves(LegalMoves::Moves(vec![]));

        engine.refresh_legal_moves().await;

        let view = engine.view();
        assert_eq!(view.board, Some(penalised));
        assert!(view.legal_moves.is_empty());
        assert_eq!(view.highlight, None);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_pass_right_after_move_clears_highlight() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;

        let mut penalised = after_exchange();
        penalised.black_score = 1;
        mock.queue_move(MoveOutcome {
            board: after_exchange(),
            opponent_move: Some(sq(5, 5)),
        });
        mock.queue_legal_moves(LegalMoves::ForcedPass {
            board: penalised.clone(),
            opponent_move: None,
        });
        mock.queue_legal_moves(LegalMoves::Moves(vec![sq(4, 1)]));

        engine.submit_local_move(sq(2, 3)).await.unwrap();

        let view = engine.view();
        assert_eq!(view.board, Some(penalised));
        assert_eq!(view.highlight, None);

        // The superseded opponent highlight never shows up later either.
        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(engine.view().highlight, None);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(engine.view().highlight, None);
    }

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        mock.queue_legal_moves(LegalMoves::Moves(vec![sq(2, 3), sq(4, 1)]));
        mock.queue_legal_moves(LegalMoves::Moves(vec![sq(2, 3), sq(4, 1)]));

        engine.refresh_legal_moves().await;
        let first = engine.view().legal_moves;
        engine.refresh_legal_moves().await;
        assert_eq!(engine.view().legal_moves, first);
    }

    #[tokio::test]
    async fn failed_refresh_clears_cache_quietly() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        mock.fail_next_legal_moves(ServiceError::Timeout);

        engine.refresh_legal_moves().await;

        let view = engine.view();
        assert!(view.legal_moves.is_empty());
        assert_eq!(view.last_error, None);
    }

    // ===========================================
    // Reset Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn reset_discards_late_reply() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        mock.set_latency(Duration::from_millis(200));
        mock.queue_move(MoveOutcome {
            board: after_exchange(),
            opponent_move: Some(sq(5, 5)),
        });

        let submit = tokio::spawn({
            let engine = engine.clone();
            async move { engine.submit_local_move(sq(2, 3)).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.reset();
        submit.await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        let view = engine.view();
        assert!(view.board.is_none());
        assert!(view.highlight.is_none());
        assert!(!view.pending);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_highlight_tasks() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        mock.queue_move(MoveOutcome {
            board: after_exchange(),
            opponent_move: Some(sq(5, 5)),
        });
        mock.queue_legal_moves(LegalMoves::Moves(vec![sq(4, 1)]));

        engine.submit_local_move(sq(2, 3)).await.unwrap();
        engine.reset();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(engine.view().highlight.is_none());
    }

    // ===========================================
    // Probe Tests
    // ===========================================

    #[tokio::test]
    async fn opponent_probe_leaves_session_alone() {
        let mock = MockGameService::new();
        let engine = started(&mock).await;
        mock.queue_opponent_move(MachineMove {
            square: sq(5, 5),
            evaluation: Some(2.0),
        });
        let before = engine.view();

        let reply = engine.fetch_opponent_move().await.unwrap();

        assert_eq!(reply.square, sq(5, 5));
        assert_eq!(engine.view(), before);
    }

    #[tokio::test]
    async fn health_passes_through() {
        let engine = engine_with(&MockGameService::new());
        assert_eq!(engine.health().await.unwrap().status, "healthy");
    }
}
