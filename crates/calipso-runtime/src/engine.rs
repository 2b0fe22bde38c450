//! The main loop: input, camera, throttled rendering, agents, CA step, swap.

use crate::clock::SimulationClock;
use crate::input::{Command, InputFrame};
use crate::platform::{Platform, StatusLine};
use calipso_core::{Error, Result, RunConfig};
use calipso_render::{Camera, Frame, ViewportRenderer};
use calipso_world::{AgentRegistry, Grid, SimRng, Simulation, WorldState};
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Window closed or escape pressed
    Quit,
    /// `max_steps` reached
    StepBudget,
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub frames: u64,
    pub agents: usize,
    pub active_agents: usize,
    pub reason: StopReason,
}

pub struct Engine<S: Simulation, P: Platform> {
    config: RunConfig,
    sim: S,
    platform: P,
    world: WorldState,
    agents: AgentRegistry<S::Agent>,
    camera: Camera,
    renderer: ViewportRenderer,
    clock: SimulationClock,
    frame: Frame,
    rng: SimRng,
    compact_agents: bool,
    opened: bool,
}

impl<S: Simulation, P: Platform> Engine<S, P> {
    /// Validate the configuration and build the initial world and agents
    pub fn new(config: RunConfig, mut sim: S, platform: P) -> Result<Self> {
        config.validate()?;

        let mut rng = SimRng::seed_from_u64(config.seed);
        let world = init_world(&mut sim, &config, &mut rng)?;

        let palette = sim.palette();
        let agents = AgentRegistry::from_agents(sim.make_agents(&config, &mut rng));
        let renderer = ViewportRenderer::new(&palette, sim.agent_palette().as_ref());
        let clock = SimulationClock::new(config.render_periods.clone(), config.target_fps)?;

        info!(
            grid_width = config.grid_width,
            grid_height = config.grid_height,
            agents = agents.len(),
            seed = config.seed,
            "Engine initialized"
        );

        Ok(Self {
            camera: Camera::from_config(&config),
            frame: Frame::new(config.viewport_width, config.viewport_height),
            config,
            sim,
            platform,
            world,
            agents,
            renderer,
            clock,
            rng,
            compact_agents: false,
            opened: false,
        })
    }

    /// Drop inactive agents from the registry after every step
    pub fn with_compaction(mut self, enabled: bool) -> Self {
        self.compact_agents = enabled;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn simulation(&self) -> &S {
        &self.sim
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn agents(&self) -> &AgentRegistry<S::Agent> {
        &self.agents
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Loop until quit or the step budget runs out
    #[instrument(skip(self), fields(title = %self.config.title, max_steps = ?self.config.max_steps))]
    pub fn run(&mut self) -> Result<RunSummary> {
        self.open()?;

        let reason = loop {
            if let Some(reason) = self.iterate()? {
                break reason;
            }
        };

        self.platform.close()?;
        self.opened = false;

        let summary = self.summary(reason);
        info!(
            steps = summary.steps,
            frames = summary.frames,
            agents = summary.agents,
            reason = ?summary.reason,
            "Run finished"
        );
        Ok(summary)
    }

    /// One pass of the main loop; `Some` once the run is over
    pub fn iterate(&mut self) -> Result<Option<StopReason>> {
        self.open()?;

        if self.budget_spent() {
            return Ok(Some(StopReason::StepBudget));
        }

        let input = self.platform.poll_input()?;
        if self.handle_input(&input) {
            return Ok(Some(StopReason::Quit));
        }
        self.camera.clamp();

        if self.clock.should_render() {
            self.render()?;
        }

        let step = self.clock.step();
        let pass = self.agents.update_all(
            self.world.current_mut(),
            &mut self.sim,
            &mut self.rng,
            step,
        );
        if pass.spawned > 0 {
            trace!(step, spawned = pass.spawned, "Agents spawned");
        }

        let (current, next) = self.world.split();
        self.sim.step(current, next, &mut self.rng);
        self.world.swap();

        if self.compact_agents {
            self.agents.compact();
        }

        if let Some(sps) = self.clock.step_done() {
            debug!(step = self.clock.step(), sps, fps = self.clock.fps(), "Throughput");
        }

        if step % 10 == 0 {
            if self.config.verbose {
                info!(step, agents = self.agents.len(), "Step");
            } else {
                trace!(step, agents = self.agents.len(), "Step");
            }
        }

        Ok(None)
    }

    /// Rebuild world and agents from the initializers; the step counter keeps going.
    ///
    /// On error the current world and agents are left untouched.
    pub fn reset_simulation(&mut self) -> Result<()> {
        self.world = init_world(&mut self.sim, &self.config, &mut self.rng)?;
        self.agents = AgentRegistry::from_agents(self.sim.make_agents(&self.config, &mut self.rng));
        info!(step = self.clock.step(), agents = self.agents.len(), "Simulation reset");
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        if !self.opened {
            self.platform.open(
                &self.config.title,
                self.config.viewport_width,
                self.config.viewport_height,
            )?;
            self.opened = true;
        }
        Ok(())
    }

    fn budget_spent(&self) -> bool {
        self.config
            .max_steps
            .is_some_and(|max| self.clock.step() >= max)
    }

    /// Apply edge-triggered commands, then held-key panning; `true` means quit
    fn handle_input(&mut self, input: &InputFrame) -> bool {
        if input.events.iter().any(|event| event.command() == Command::Quit) {
            return true;
        }

        for event in &input.events {
            match event.command() {
                Command::ZoomIn => self.camera.zoom_in(),
                Command::ZoomOut => self.camera.zoom_out(),
                Command::ThrottleForward => {
                    let period = self.clock.throttle_mut().forward();
                    info!(period, "Rendering every {} steps", period);
                }
                Command::ThrottleBack => {
                    let period = self.clock.throttle_mut().back();
                    info!(period, "Rendering every {} steps", period);
                }
                Command::ResetCamera => self.camera.reset(),
                Command::ResetSimulation => {
                    if let Err(err) = self.reset_simulation() {
                        warn!(error = %err, "Simulation reset failed, keeping the current world");
                    }
                }
                Command::Pan(x, y) => self.camera.pan(x, y),
                Command::Quit => {}
            }
        }

        let (x, y) = input.held.pan();
        if x != 0 || y != 0 {
            self.camera.pan(x, y);
        }

        false
    }

    fn render(&mut self) -> Result<()> {
        self.renderer.render(
            &mut self.frame,
            self.world.current(),
            &self.camera,
            self.agents.agents(),
        );

        let status = StatusLine {
            fps: self.clock.fps(),
            sps: self.clock.sps(),
            step: self.clock.step(),
            render_every: self.clock.throttle().period(),
            detail: self.sim.status(),
        };
        self.platform.present(&self.frame, &status)?;
        self.clock.frame_presented();
        Ok(())
    }

    fn summary(&self, reason: StopReason) -> RunSummary {
        RunSummary {
            steps: self.clock.step(),
            frames: self.clock.frames(),
            agents: self.agents.len(),
            active_agents: self.agents.active_count(),
            reason,
        }
    }
}

fn init_world<S: Simulation>(sim: &mut S, config: &RunConfig, rng: &mut SimRng) -> Result<WorldState> {
    let world = sim.init(config, rng)?;
    let expected = (config.grid_width, config.grid_height);
    if world.dims() != expected {
        return Err(Error::Config(format!(
            "initializer built a {}x{} world, configured {}x{}",
            world.dims().0,
            world.dims().1,
            expected.0,
            expected.1
        )));
    }

    let palette = sim.palette();
    if let Some(code) = first_missing_color(world.current(), |code| palette.contains(code)) {
        return Err(Error::Config(format!(
            "no color defined for cell code {code} used by the initial grid"
        )));
    }
    Ok(world)
}

/// Lowest cell code present in `grid` that `has_color` rejects
fn first_missing_color(grid: &Grid, has_color: impl Fn(u8) -> bool) -> Option<u8> {
    let mut seen = [false; 256];
    for &code in grid.as_slice() {
        seen[code as usize] = true;
    }
    (0..=u8::MAX).find(|&code| seen[code as usize] && !has_color(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{HeldKeys, Key};
    use crate::platform::HeadlessPlatform;
    use calipso_core::{Palette, Rgb};
    use calipso_world::NoAgent;

    /// Counts up every cell by one each step
    struct Counter {
        fill: u8,
    }

    impl Simulation for Counter {
        type Agent = NoAgent<Self>;

        fn init(&mut self, config: &RunConfig, _rng: &mut SimRng) -> Result<WorldState> {
            Ok(WorldState::from_current(Grid::filled(
                config.grid_width,
                config.grid_height,
                self.fill,
            )))
        }

        fn step(&mut self, current: &Grid, next: &mut Grid, _rng: &mut SimRng) {
            for (i, cell) in next.as_mut_slice().iter_mut().enumerate() {
                *cell = current.as_slice()[i].wrapping_add(1);
            }
        }

        fn palette(&self) -> Palette {
            (0..=u8::MAX).map(|code| (code, Rgb(code, code, code))).collect()
        }
    }

    fn config() -> RunConfig {
        RunConfig {
            grid_width: 10,
            grid_height: 10,
            viewport_width: 40,
            viewport_height: 40,
            target_fps: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_color_found() {
        let mut grid = Grid::new(3, 1);
        grid.put(1, 0, 5);
        grid.put(2, 0, 9);
        assert_eq!(first_missing_color(&grid, |code| code < 9), Some(9));
        assert_eq!(first_missing_color(&grid, |_| true), None);
    }

    #[test]
    fn test_wrong_world_shape_is_config_error() {
        struct Wrong;

        impl Simulation for Wrong {
            type Agent = NoAgent<Self>;

            fn init(&mut self, _config: &RunConfig, _rng: &mut SimRng) -> Result<WorldState> {
                Ok(WorldState::from_current(Grid::new(3, 3)))
            }

            fn step(&mut self, current: &Grid, next: &mut Grid, _rng: &mut SimRng) {
                next.copy_from(current);
            }

            fn palette(&self) -> Palette {
                Palette::new().with(0, Rgb::BLACK)
            }
        }

        let result = Engine::new(config(), Wrong, HeadlessPlatform::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_escape_stops_before_any_work() {
        let platform = HeadlessPlatform::with_script([InputFrame::press(Key::Escape)]);
        let mut engine = Engine::new(config(), Counter { fill: 0 }, platform).unwrap();

        let summary = engine.run().unwrap();

        assert_eq!(summary.reason, StopReason::Quit);
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.frames, 0);
        assert_eq!(engine.world().current().at(0, 0), 0);
        assert!(engine.platform().is_closed());
    }

    #[test]
    fn test_quit_wins_over_other_keys() {
        let input = InputFrame::from_events([
            crate::InputEvent::Key(crate::KeyPress::shifted(Key::Z)),
            crate::InputEvent::Quit,
        ]);
        let mut engine =
            Engine::new(config(), Counter { fill: 0 }, HeadlessPlatform::with_script([input])).unwrap();

        assert_eq!(engine.iterate().unwrap(), Some(StopReason::Quit));
        assert_eq!(engine.camera().zoom(), 1.0);
    }

    #[test]
    fn test_held_shift_arrows_pan_each_iteration() {
        let held = HeldKeys {
            shift: true,
            right: true,
            ..Default::default()
        };
        let script = [
            InputFrame::press_shifted(Key::Z),
            InputFrame::press_shifted(Key::Z),
            InputFrame::press_shifted(Key::Z),
            InputFrame::empty().with_held(held),
            InputFrame::empty().with_held(HeldKeys { shift: false, ..held }),
        ];
        let mut engine =
            Engine::new(config(), Counter { fill: 0 }, HeadlessPlatform::with_script(script)).unwrap();

        for _ in 0..3 {
            engine.iterate().unwrap();
        }
        let before = engine.camera().focus().0;
        engine.iterate().unwrap();
        let panned = engine.camera().focus().0;
        assert!(panned > before);

        engine.iterate().unwrap();
        assert_eq!(engine.camera().focus().0, panned);
    }

    #[test]
    fn test_verbose_run_reaches_budget() {
        let config = RunConfig {
            max_steps: Some(25),
            verbose: true,
            ..config()
        };
        let mut engine = Engine::new(config, Counter { fill: 0 }, HeadlessPlatform::new()).unwrap();

        let summary = engine.run().unwrap();

        assert_eq!(summary.reason, StopReason::StepBudget);
        assert_eq!(summary.steps, 25);
        assert_eq!(summary.frames, 25);
        assert_eq!(engine.world().current().at(4, 4), 25);
    }
}
