use std::fmt;
use std::time::Duration;

use glam::Mat4;
use serde::Serialize;
use tilehop_common::{GRID_SIZE, GridPos, Transform};
use tilehop_input::{InputEvent, InputSource, Modifier, PointerButton};
use tilehop_kernel::{GameState, MovingTileAnimator, SessionRng, TileKind};
use tilehop_render::{CameraController, Mesh, MeshHandle, RenderError, Renderer};

use crate::config::SessionConfig;
use crate::timer::RespawnTimer;

/// Height of the player and obstacle cube centres.
const CUBE_Z: f32 = 1.5;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitReason {
    Won,
    Quit,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub reason: ExitReason,
    pub score: i64,
    pub ticks: u64,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason == ExitReason::Won {
            writeln!(f, "YOU WIN!")?;
        }
        write!(f, "SCORE: {}", self.score)
    }
}

#[derive(Debug, Clone, Copy)]
struct MeshSet {
    player: MeshHandle,
    tile: MeshHandle,
    obstacle: MeshHandle,
}

impl MeshSet {
    fn upload<R: Renderer + ?Sized>(renderer: &mut R) -> Result<Self, RenderError> {
        Ok(Self {
            player: renderer.upload_mesh(&Mesh::player_cube())?,
            tile: renderer.upload_mesh(&Mesh::floor_tile())?,
            obstacle: renderer.upload_mesh(&Mesh::obstacle_cube())?,
        })
    }
}

/// Per-tick orchestrator. Owns the game state and the camera.
///
/// Hosts feed it input with [`GameLoop::handle_event`] and advance it with
/// [`GameLoop::tick`]; [`GameLoop::run`] does both from an [`InputSource`].
#[derive(Debug)]
pub struct GameLoop {
    state: GameState,
    camera: CameraController,
    respawn: RespawnTimer,
    meshes: MeshSet,
    max_frame_delta: Duration,
    last_tick: Option<Duration>,
    ticks: u64,
    space_held: bool,
    primary_held: bool,
    quit: bool,
}

impl GameLoop {
    /// Start a session from config, seeding from the clock if no seed is set.
    pub fn from_config<R: Renderer + ?Sized>(
        config: &SessionConfig,
        renderer: &mut R,
    ) -> Result<Self, SessionError> {
        let seed = config
            .seed
            .unwrap_or_else(|| SessionRng::from_time().next_u64());
        let state = GameState::new(seed).with_animator(MovingTileAnimator::new(config.bounce_rate));
        Self::new(state, config, renderer)
    }

    /// Wrap an existing state. Uploads the three session meshes.
    pub fn new<R: Renderer + ?Sized>(
        state: GameState,
        config: &SessionConfig,
        renderer: &mut R,
    ) -> Result<Self, SessionError> {
        let meshes = MeshSet::upload(renderer)?;
        let mut camera = CameraController::default();
        camera
            .projection
            .resize(config.window_width, config.window_height);
        tracing::info!(seed = state.seed(), "session started");
        Ok(Self {
            state,
            camera,
            respawn: RespawnTimer::new(config.obstacle_interval()),
            meshes,
            max_frame_delta: config.max_frame_delta(),
            last_tick: None,
            ticks: 0,
            space_held: false,
            primary_held: false,
            quit: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable access for hosts that drain the event log.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.quit || self.state.is_won()
    }

    /// The outcome once the session has ended.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        let reason = if self.state.is_won() {
            ExitReason::Won
        } else if self.quit {
            ExitReason::Quit
        } else {
            return None;
        };
        Some(SessionOutcome {
            reason,
            score: self.state.player().score(),
            ticks: self.ticks,
        })
    }

    /// Apply one input event immediately.
    pub fn handle_event(&mut self, event: &InputEvent) {
        if self.is_finished() {
            return;
        }
        match *event {
            InputEvent::DirectionReleased(dir) => {
                self.state.release_direction(dir, self.space_held);
            }
            InputEvent::DirectionPressed(_) => {}
            InputEvent::ModifierPressed(Modifier::Space) => self.space_held = true,
            InputEvent::ModifierReleased(Modifier::Space) => self.space_held = false,
            InputEvent::PointerButton { button, pressed } => {
                if button == PointerButton::Primary {
                    self.primary_held = pressed;
                }
            }
            InputEvent::PointerMoved(delta) => self.camera.on_drag(delta.x, self.primary_held),
            InputEvent::Scrolled(delta) => self.camera.on_scroll(delta),
            InputEvent::CameraModeSelected(mode) => self.camera.set_mode(mode),
            InputEvent::WindowResized { width, height } => {
                self.camera.projection.resize(width, height);
            }
            InputEvent::Quit | InputEvent::WindowClosed => {
                tracing::info!(score = self.state.player().score(), "session quit");
                self.quit = true;
            }
        }
    }

    /// Advance one frame at session time `now` and draw it.
    ///
    /// On a draw failure the frame is abandoned without `present`.
    pub fn tick<R: Renderer + ?Sized>(
        &mut self,
        now: Duration,
        renderer: &mut R,
    ) -> Result<(), SessionError> {
        if self.is_finished() {
            return Ok(());
        }
        let _span = tracing::info_span!("tick", tick = self.ticks).entered();
        self.ticks += 1;

        self.state.apply_pending();

        if self.respawn.poll(now) {
            self.state.respawn_obstacles();
        }

        let dt = match self.last_tick {
            Some(prev) => now.saturating_sub(prev).min(self.max_frame_delta),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);
        self.state.advance_animation(dt.as_secs_f32());

        let view_proj = self.camera.view_projection(self.state.player().position());
        self.draw(view_proj, renderer)
    }

    fn draw<R: Renderer + ?Sized>(
        &self,
        view_proj: Mat4,
        renderer: &mut R,
    ) -> Result<(), SessionError> {
        renderer.clear();
        renderer.set_view_projection(view_proj);

        let grid = self.state.grid();
        let bounce = self.state.animator().offset();
        let mut draws = 1;

        renderer.draw(
            self.meshes.player,
            model_at(self.state.player().position(), CUBE_Z),
        )?;

        for col in 0..GRID_SIZE {
            for row in 0..GRID_SIZE {
                let z = match grid.tile_kind(col, row) {
                    TileKind::Floor => 0.0,
                    TileKind::Moving => bounce,
                    TileKind::Hole => continue,
                };
                renderer.draw(self.meshes.tile, model_at(GridPos::new(col, row), z))?;
                draws += 1;
            }
        }

        for col in 0..GRID_SIZE {
            if let Some(row) = grid.obstacle_row(col).filter(|row| *row < GRID_SIZE) {
                renderer.draw(self.meshes.obstacle, model_at(GridPos::new(col, row), CUBE_Z))?;
                draws += 1;
            }
        }

        renderer.present();
        tracing::trace!(draws, "frame drawn");
        Ok(())
    }

    /// Drive the session headlessly: one input frame per tick, `step` of
    /// simulated time between ticks. An exhausted source ends the session
    /// as a quit.
    pub fn run<I, R>(
        &mut self,
        input: &mut I,
        renderer: &mut R,
        step: Duration,
    ) -> Result<SessionOutcome, SessionError>
    where
        I: InputSource + ?Sized,
        R: Renderer + ?Sized,
    {
        let mut now = self.last_tick.map_or(Duration::ZERO, |t| t + step);
        while !self.is_finished() {
            let Some(events) = input.poll_frame() else {
                tracing::debug!("input exhausted");
                self.quit = true;
                break;
            };
            for event in &events {
                self.handle_event(event);
            }
            self.tick(now, renderer)?;
            now += step;
        }
        let outcome = self.outcome().unwrap_or(SessionOutcome {
            reason: ExitReason::Quit,
            score: self.state.player().score(),
            ticks: self.ticks,
        });
        tracing::info!(
            reason = ?outcome.reason,
            score = outcome.score,
            ticks = outcome.ticks,
            "session ended"
        );
        Ok(outcome)
    }
}

fn model_at(pos: GridPos, z: f32) -> Mat4 {
    Transform::from_translation(pos.to_vec3(z)).to_matrix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use tilehop_common::{CameraMode, Direction, GOAL, ORIGIN};
    use tilehop_input::ScriptedInput;
    use tilehop_kernel::{FALL_PENALTY, GameEvent, GridState, HAZARD_MAX, PlayerState, WIN_BONUS};
    use tilehop_render::RecordingRenderer;

    const OPEN: [i32; 10] = [HAZARD_MAX; 10];
    const STEP: Duration = Duration::from_millis(16);

    fn session(grid: GridState) -> (GameLoop, RecordingRenderer) {
        let mut renderer = RecordingRenderer::new();
        let game = GameLoop::new(
            GameState::with_grid(grid, 3),
            &SessionConfig::default(),
            &mut renderer,
        )
        .unwrap();
        (game, renderer)
    }

    fn script(moves: &str) -> ScriptedInput {
        ScriptedInput::parse_moves(moves).unwrap()
    }

    #[test]
    fn walk_to_goal_on_open_board() {
        let (mut game, mut renderer) = session(GridState::default());
        let outcome = game
            .run(&mut script("R R R R R R R R R"), &mut renderer, STEP)
            .unwrap();
        assert_eq!(outcome.reason, ExitReason::Quit);
        assert_eq!(game.state().player().position(), GridPos::new(9, 0));
        assert_eq!(game.state().player().score(), 0);

        let (mut game, mut renderer) = session(GridState::default());
        let outcome = game
            .run(
                &mut script("R R R R R R R R R U U U U U U U U U"),
                &mut renderer,
                STEP,
            )
            .unwrap();
        assert_eq!(outcome.reason, ExitReason::Won);
        assert_eq!(outcome.score, WIN_BONUS);
        assert_eq!(game.state().player().position(), GOAL);
        // The winning release ends the session before its tick.
        assert_eq!(outcome.ticks, 17);
    }

    #[test]
    fn stepping_into_hole_resets_player() {
        let mut holes = OPEN;
        holes[4] = 3;
        let mut renderer = RecordingRenderer::new();
        let state = GameState::with_grid(GridState::from_layout(holes, OPEN, OPEN), 1)
            .with_player(PlayerState::at(GridPos::new(3, 3)));
        let mut game = GameLoop::new(state, &SessionConfig::default(), &mut renderer).unwrap();

        game.run(&mut script("R"), &mut renderer, STEP).unwrap();
        assert_eq!(game.state().player().position(), ORIGIN);
        assert_eq!(game.state().player().score(), -FALL_PENALTY);
    }

    #[test]
    fn stepping_into_obstacle_resets_player() {
        let mut obstacles = OPEN;
        obstacles[0] = 1;
        let (mut game, mut renderer) =
            session(GridState::from_layout(OPEN, obstacles, OPEN));

        game.run(&mut script("U"), &mut renderer, STEP).unwrap();
        assert_eq!(game.state().player().position(), ORIGIN);
        assert_eq!(game.state().player().score(), -FALL_PENALTY);
        assert!(game.state().events().contains(&GameEvent::Fell {
            at: GridPos::new(0, 1),
            score: -FALL_PENALTY
        }));
    }

    #[test]
    fn stepping_left_into_obstacle_resets_player() {
        let mut obstacles = OPEN;
        obstacles[2] = 4;
        let mut renderer = RecordingRenderer::new();
        let state = GameState::with_grid(GridState::from_layout(OPEN, obstacles, OPEN), 1)
            .with_player(PlayerState::at(GridPos::new(3, 4)));
        let mut game = GameLoop::new(state, &SessionConfig::default(), &mut renderer).unwrap();

        game.run(&mut script("L R"), &mut renderer, STEP).unwrap();
        // The fall sends the player home; the next step starts from there.
        assert_eq!(game.state().player().position(), GridPos::new(1, 0));
        assert_eq!(game.state().player().score(), -FALL_PENALTY);
    }

    #[test]
    fn respawned_obstacle_is_a_hazard() {
        let mut state = GameState::new(11);
        state.respawn_obstacles();
        assert_eq!(state.grid().obstacle_generation(), 2);
        let row = state.grid().obstacle_row(3).unwrap();
        let state = state.with_player(PlayerState::at(GridPos::new(3, row - 1)));

        let mut renderer = RecordingRenderer::new();
        let mut game = GameLoop::new(state, &SessionConfig::default(), &mut renderer).unwrap();
        game.run(&mut script("U"), &mut renderer, STEP).unwrap();
        assert_eq!(game.state().player().position(), ORIGIN);
        assert_eq!(game.state().player().score(), -FALL_PENALTY);
        assert_eq!(
            game.state().events().last(),
            Some(&GameEvent::Fell {
                at: GridPos::new(3, row),
                score: -FALL_PENALTY
            })
        );
    }

    #[test]
    fn one_move_per_tick() {
        let (mut game, mut renderer) = session(GridState::default());
        game.handle_event(&InputEvent::DirectionReleased(Direction::Up));
        game.handle_event(&InputEvent::DirectionReleased(Direction::Right));
        game.tick(Duration::ZERO, &mut renderer).unwrap();
        assert_eq!(game.state().player().position(), GridPos::new(0, 1));
        game.tick(STEP, &mut renderer).unwrap();
        assert_eq!(game.state().player().position(), GridPos::new(0, 1));
    }

    #[test]
    fn jump_requires_space_held_at_release() {
        let (mut game, mut renderer) = session(GridState::default());
        game.handle_event(&InputEvent::ModifierPressed(Modifier::Space));
        game.handle_event(&InputEvent::DirectionReleased(Direction::Right));
        game.handle_event(&InputEvent::ModifierReleased(Modifier::Space));
        game.tick(Duration::ZERO, &mut renderer).unwrap();
        assert_eq!(game.state().player().position(), GridPos::new(2, 0));

        game.handle_event(&InputEvent::DirectionReleased(Direction::Right));
        game.tick(STEP, &mut renderer).unwrap();
        assert_eq!(game.state().player().position(), GridPos::new(3, 0));
    }

    #[test]
    fn open_board_draws_player_and_every_tile() {
        let (mut game, mut renderer) = session(GridState::default());
        game.tick(Duration::ZERO, &mut renderer).unwrap();

        let frame = renderer.last_frame().unwrap();
        assert_eq!(frame.draws.len(), 101);
        assert_eq!(frame.count_of(game.meshes.player), 1);
        assert_eq!(frame.count_of(game.meshes.tile), 100);
        assert_eq!(frame.count_of(game.meshes.obstacle), 0);
        let player = frame.draws_of(game.meshes.player).next().unwrap();
        assert_eq!(player.translation(), Vec3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn frame_reflects_hazard_layout() {
        let mut holes = OPEN;
        let mut obstacles = OPEN;
        let mut moving = OPEN;
        holes[0] = 3;
        moving[1] = 4;
        obstacles[2] = 5;
        let (mut game, mut renderer) = session(GridState::from_layout(holes, obstacles, moving));
        game.tick(Duration::ZERO, &mut renderer).unwrap();
        game.tick(Duration::from_millis(50), &mut renderer).unwrap();

        let frame = renderer.last_frame().unwrap();
        let tiles: Vec<Vec3> = frame
            .draws_of(game.meshes.tile)
            .map(|d| d.translation())
            .collect();
        assert_eq!(tiles.len(), 99);
        assert!(!tiles.contains(&Vec3::new(0.0, 3.0, 0.0)));

        let bounce = game.state().animator().offset();
        assert!(bounce < 0.0);
        assert!(tiles.contains(&Vec3::new(1.0, 4.0, bounce)));

        let obstacles: Vec<Vec3> = frame
            .draws_of(game.meshes.obstacle)
            .map(|d| d.translation())
            .collect();
        assert_eq!(obstacles, vec![Vec3::new(2.0, 5.0, 1.5)]);
        assert_eq!(frame.draws.len(), 1 + 99 + 1);
    }

    #[test]
    fn obstacle_hides_moving_tile_on_same_row() {
        let mut obstacles = OPEN;
        let mut moving = OPEN;
        obstacles[6] = 2;
        moving[6] = 2;
        let (mut game, mut renderer) = session(GridState::from_layout(OPEN, obstacles, moving));
        game.tick(Duration::ZERO, &mut renderer).unwrap();
        let frame = renderer.last_frame().unwrap();
        assert_eq!(frame.count_of(game.meshes.tile), 99);
        assert_eq!(frame.count_of(game.meshes.obstacle), 1);
    }

    #[test]
    fn obstacles_respawn_every_interval() {
        let (mut game, mut renderer) = session(GridState::default());
        let mut frames = ScriptedInput::new();
        for _ in 0..13 {
            frames.push_frame(Vec::new());
        }
        game.run(&mut frames, &mut renderer, Duration::from_secs(1))
            .unwrap();
        // Ticks at 0..=12 s fire at 6 s and 12 s.
        assert_eq!(game.state().grid().obstacle_generation(), 2);
    }

    #[test]
    fn animation_step_is_clamped() {
        let config = SessionConfig {
            bounce_rate: 5.0,
            ..SessionConfig::default()
        };
        let mut renderer = RecordingRenderer::new();
        let mut game = GameLoop::new(
            GameState::with_grid(GridState::default(), 1)
                .with_animator(MovingTileAnimator::new(config.bounce_rate)),
            &config,
            &mut renderer,
        )
        .unwrap();
        game.tick(Duration::ZERO, &mut renderer).unwrap();
        assert_eq!(game.state().animator().offset(), 0.0);
        game.tick(Duration::from_secs(10), &mut renderer).unwrap();
        assert!((game.state().animator().offset() + 0.5).abs() < 1e-5);
    }

    #[test]
    fn camera_events_reach_controller() {
        let (mut game, mut renderer) = session(GridState::default());
        let outcome = game
            .run(&mut script("@helicopter . Q"), &mut renderer, STEP)
            .unwrap();
        assert!(game.camera().is_active(CameraMode::Helicopter));
        assert_eq!(outcome.reason, ExitReason::Quit);
        assert_eq!(outcome.ticks, 2);

        let (mut game, _) = session(GridState::default());
        game.handle_event(&InputEvent::CameraModeSelected(CameraMode::Helicopter));
        game.handle_event(&InputEvent::PointerMoved(Vec2::new(3.0, 0.0)));
        assert_eq!(game.camera().rotation_degrees(), 45.0);
        game.handle_event(&InputEvent::PointerButton {
            button: PointerButton::Primary,
            pressed: true,
        });
        game.handle_event(&InputEvent::PointerMoved(Vec2::new(3.0, 0.0)));
        game.handle_event(&InputEvent::Scrolled(Vec2::new(0.0, -1.0)));
        assert_eq!(game.camera().rotation_degrees(), 46.0);
        assert_eq!(game.camera().zoom_offset(), 1);
    }

    #[test]
    fn finished_session_ignores_ticks_and_input() {
        let (mut game, mut renderer) = session(GridState::default());
        game.handle_event(&InputEvent::WindowClosed);
        assert!(game.is_finished());
        game.tick(Duration::ZERO, &mut renderer).unwrap();
        assert_eq!(game.ticks(), 0);
        assert_eq!(renderer.frames_presented(), 0);

        game.handle_event(&InputEvent::DirectionReleased(Direction::Up));
        assert_eq!(game.state().player().pending(), None);
        assert_eq!(
            game.outcome(),
            Some(SessionOutcome {
                reason: ExitReason::Quit,
                score: 0,
                ticks: 0
            })
        );
    }

    #[test]
    fn outcome_display() {
        let won = SessionOutcome {
            reason: ExitReason::Won,
            score: 90,
            ticks: 12,
        };
        assert_eq!(won.to_string(), "YOU WIN!\nSCORE: 90");
        let quit = SessionOutcome {
            reason: ExitReason::Quit,
            score: -20,
            ticks: 3,
        };
        assert_eq!(quit.to_string(), "SCORE: -20");
    }

    #[test]
    fn seeded_config_is_reproducible() {
        let config = SessionConfig {
            seed: Some(11),
            ..SessionConfig::default()
        };
        let mut renderer = RecordingRenderer::new();
        let a = GameLoop::from_config(&config, &mut renderer).unwrap();
        let b = GameLoop::from_config(&config, &mut renderer).unwrap();
        assert_eq!(a.state().grid(), b.state().grid());
        assert_eq!(a.state().seed(), 11);
        assert_eq!(a.state().animator().rate(), 30.0);
    }
}
