use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{NO_PLAYER_SELECTED_ERROR, SPIN_IN_PROGRESS_ERROR};

/// One forfeit on the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WheelOption {
    pub text: &'static str,
    pub color: &'static str,
    pub weight: u32,
}

const fn option(text: &'static str, color: &'static str, weight: u32) -> WheelOption {
    WheelOption { text, color, weight }
}

pub const WHEEL_OPTIONS: [WheelOption; 18] = [
    option("Wear bibs tucked into shorts", "#ef4444", 6),
    option("Sing a song of team's choice", "#dc2626", 6),
    option("Speech: Why I'm the best player", "#b91c1c", 6),
    option("50 burpees after training", "#991b1b", 6),
    option("Read 3 Google searches aloud", "#f97316", 6),
    option("Bring snacks next session", "#eab308", 6),
    option("Clean all bibs after training", "#84cc16", 6),
    option("Say Yes coach before every sentence", "#22c55e", 6),
    option("Take warm-up next game", "#10b981", 6),
    option("Make tea or coffee for coaches", "#06b6d4", 6),
    option("3 pitch laps before kick-off", "#3b82f6", 6),
    option("Call parent on speaker", "#6366f1", 6),
    option("Do a teammate impression", "#8b5cf6", 6),
    option("Wear shirt backwards", "#a855f7", 6),
    option("Embarrassing selfie in group chat", "#d946ef", 6),
    option("Bring Lucozade for the team", "#ec4899", 6),
    option("Wear Sondico boots for 15 mins", "#f43f5e", 6),
    option("Unlucky! Pay double fine", "#7c2d12", 2),
];

// Constants for the vertical strip animation
pub const SECTOR_HEIGHT: f64 = 80.0; // Height of one option in pixels
pub const VISIBLE_HEIGHT: f64 = 384.0; // Height of the viewport the strip scrolls under
pub const RENDERED_COPIES: u32 = 4; // Copies of the option list rendered in the strip
pub const LOCK_CYCLE: u32 = 2; // Copy the strip always comes to rest in
pub const MIN_FULL_CYCLES: u32 = 3;
pub const MAX_FULL_CYCLES: u32 = 5;
pub const SPIN_DURATION_MS: u64 = 4000;

/// Layout of the vertical strip. The pointer sits at the vertical centre of
/// the viewport while the strip scrolls beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelGeometry {
    pub option_count: usize,
    pub sector_height: f64,
    pub visible_height: f64,
    pub rendered_copies: u32,
    pub lock_cycle: u32,
}

impl Default for WheelGeometry {
    fn default() -> Self {
        Self::new(WHEEL_OPTIONS.len())
    }
}

impl WheelGeometry {
    pub const fn new(option_count: usize) -> Self {
        Self::with_dimensions(option_count, SECTOR_HEIGHT, VISIBLE_HEIGHT)
    }

    pub const fn with_dimensions(option_count: usize, sector_height: f64, visible_height: f64) -> Self {
        Self {
            option_count,
            sector_height,
            visible_height,
            rendered_copies: RENDERED_COPIES,
            lock_cycle: LOCK_CYCLE,
        }
    }

    /// Length of one full pass through the option list.
    pub fn total_height(&self) -> f64 {
        self.option_count as f64 * self.sector_height
    }

    pub fn pointer_position(&self) -> f64 {
        self.visible_height / 2.0
    }

    /// Makes the single random draw of a spin.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SpinPlan {
        let full_cycles = rng.gen_range(MIN_FULL_CYCLES..=MAX_FULL_CYCLES);
        let total = self.total_height();
        let offset = if total > 0.0 { rng.gen_range(0.0..total) } else { 0.0 };
        let plan = self.plan_for(full_cycles, offset);
        log::debug!(
            "wheel draw: cycles={} offset={:.2} final={:.2}",
            plan.full_cycles,
            plan.offset,
            plan.final_position
        );
        plan
    }

    /// Builds the plan for a given draw. The resting position is pinned to the
    /// `lock_cycle` copy so the strip never scrolls past its rendered copies;
    /// `travel` is the distance covered by the multi-loop animation.
    pub fn plan_for(&self, full_cycles: u32, offset: f64) -> SpinPlan {
        let total = self.total_height();
        SpinPlan {
            full_cycles,
            offset,
            travel: full_cycles as f64 * total + offset,
            final_position: self.lock_cycle as f64 * total + offset,
        }
    }

    /// Index of the option under the pointer once the strip has scrolled to
    /// `final_position`. Adding whole cycles never changes the answer.
    pub fn select_index(&self, final_position: f64) -> usize {
        let total = self.total_height();
        if self.option_count == 0 || total <= 0.0 {
            return 0;
        }

        let position_in_cycle = final_position.rem_euclid(total);
        let position_at_pointer = (position_in_cycle + self.pointer_position()).rem_euclid(total);
        (position_at_pointer / self.sector_height).floor() as usize % self.option_count
    }
}

/// The one random draw a spin is built from, plus the positions derived
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinPlan {
    pub full_cycles: u32,
    pub offset: f64,
    pub travel: f64,
    pub final_position: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelResult {
    pub player: String,
    pub index: usize,
    pub text: String,
    pub message: String,
}

pub fn format_result_message(player: &str, text: &str) -> String {
    format!("{}: {}", player, text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinPhase {
    Idle,
    Spinning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinRefusal {
    NoPlayer,
    AlreadySpinning,
}

impl SpinRefusal {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoPlayer => NO_PLAYER_SELECTED_ERROR,
            Self::AlreadySpinning => SPIN_IN_PROGRESS_ERROR,
        }
    }
}

/// Represents the current state of the wheel
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WheelGame {
    pub phase: SpinPhase,
    pub player: Option<String>,
    pub plan: Option<SpinPlan>,
    pub last_result: Option<WheelResult>,
}

impl Default for WheelGame {
    fn default() -> Self {
        Self::new()
    }
}

impl WheelGame {
    pub fn new() -> Self {
        Self {
            phase: SpinPhase::Idle,
            player: None,
            plan: None,
            last_result: None,
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.phase == SpinPhase::Spinning
    }

    /// `Idle -> Spinning`. Refused without touching any state when no player
    /// is given or a spin is still outstanding.
    pub fn start_spin<R: Rng + ?Sized>(
        &mut self,
        player: &str,
        geometry: &WheelGeometry,
        rng: &mut R,
    ) -> Result<SpinPlan, SpinRefusal> {
        if self.is_spinning() {
            return Err(SpinRefusal::AlreadySpinning);
        }
        let player = player.trim();
        if player.is_empty() {
            return Err(SpinRefusal::NoPlayer);
        }

        let plan = geometry.draw(rng);
        self.phase = SpinPhase::Spinning;
        self.player = Some(player.to_string());
        self.plan = Some(plan);
        Ok(plan)
    }

    /// Works out the outcome of the outstanding spin from the plan drawn at
    /// its start. The game stays in `Spinning` until [`WheelGame::finish_spin`].
    pub fn resolve_spin(&self, geometry: &WheelGeometry, options: &[WheelOption]) -> Option<WheelResult> {
        if !self.is_spinning() {
            return None;
        }
        let player = self.player.as_ref()?;
        let plan = self.plan?;

        let index = geometry.select_index(plan.final_position);
        let option = options.get(index)?;
        Some(WheelResult {
            player: player.clone(),
            index,
            text: option.text.to_string(),
            message: format_result_message(player, option.text),
        })
    }

    /// `Spinning -> Idle`.
    pub fn finish_spin(&mut self, result: Option<WheelResult>) {
        self.phase = SpinPhase::Idle;
        self.player = None;
        self.plan = None;
        if result.is_some() {
            self.last_result = result;
        }
    }
}

// === API Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct SpinRequest {
    pub player: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpinResponse {
    pub player: String,
    pub plan: SpinPlan,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WheelStatusResponse {
    pub is_spinning: bool,
    pub player: Option<String>,
    pub last_result: Option<WheelResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelOptionView {
    pub text: String,
    pub color: String,
    pub weight: u32,
}

impl From<&WheelOption> for WheelOptionView {
    fn from(option: &WheelOption) -> Self {
        Self {
            text: option.text.to_string(),
            color: option.color.to_string(),
            weight: option.weight,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WheelOptionsResponse {
    pub options: Vec<WheelOptionView>,
    pub geometry: WheelGeometry,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pointer_centre_convention() {
        // 18 options of 80px: one cycle is 1440px, pointer at 192px.
        let geometry = WheelGeometry::default();
        assert_eq!(geometry.total_height(), 1440.0);

        // Offset 0 rests at 2880; (0 + 192) / 80 = 2.4 -> index 2
        let plan = geometry.plan_for(3, 0.0);
        assert_eq!(plan.final_position, 2880.0);
        assert_eq!(geometry.select_index(plan.final_position), 2);

        // (1300 + 192) mod 1440 = 52 -> index 0
        assert_eq!(geometry.select_index(geometry.plan_for(4, 1300.0).final_position), 0);

        // (1247.5 + 192) = 1439.5 -> last option
        let plan = geometry.plan_for(5, 1247.5);
        assert_eq!(geometry.select_index(plan.final_position), 17);
        assert_eq!(WHEEL_OPTIONS[17].text, "Unlucky! Pay double fine");
    }

    #[test]
    fn test_two_option_strip() {
        // Two 80px sectors, 384px viewport: cycle 160px, pointer 192px.
        let geometry = WheelGeometry::new(2);
        // 192 mod 160 = 32 -> A
        assert_eq!(geometry.select_index(0.0), 0);
        // (192 + 192) mod 160 = 64 -> A
        assert_eq!(geometry.select_index(192.0), 0);
        // (50 + 192) mod 160 = 82 -> B
        assert_eq!(geometry.select_index(50.0), 1);
        // (100 + 192) mod 160 = 132 -> B
        assert_eq!(geometry.select_index(100.0), 1);
    }

    #[test]
    fn test_extra_cycles_do_not_change_selection() {
        let geometry = WheelGeometry::default();
        let total = geometry.total_height();
        for offset in (0..1440).step_by(7) {
            let offset = offset as f64;
            let expected = geometry.select_index(offset);
            for k in 0..6 {
                assert_eq!(geometry.select_index(offset + k as f64 * total), expected);
            }
            let plan = geometry.plan_for(4, offset);
            assert_eq!(geometry.select_index(plan.travel), expected);
            assert_eq!(geometry.select_index(plan.final_position), expected);
        }
    }

    #[test]
    fn test_draw_stays_in_bounds() {
        let geometry = WheelGeometry::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let plan = geometry.draw(&mut rng);
            assert!((MIN_FULL_CYCLES..=MAX_FULL_CYCLES).contains(&plan.full_cycles));
            assert!(plan.offset >= 0.0 && plan.offset < geometry.total_height());
            // The resting position must lie inside the rendered strip.
            let strip = geometry.rendered_copies as f64 * geometry.total_height();
            assert!(plan.final_position + geometry.visible_height <= strip);
        }
    }

    #[test]
    fn test_resolved_text_matches_selected_option() {
        let geometry = WheelGeometry::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut game = WheelGame::new();
            let plan = game.start_spin("Tom Davis", &geometry, &mut rng).unwrap();
            let result = game.resolve_spin(&geometry, &WHEEL_OPTIONS).unwrap();

            assert_eq!(result.index, geometry.select_index(plan.final_position));
            assert_eq!(result.text, WHEEL_OPTIONS[result.index].text);
            assert_eq!(result.message, format!("Tom Davis: {}", WHEEL_OPTIONS[result.index].text));
        }
    }

    #[test]
    fn test_spin_state_machine() {
        let geometry = WheelGeometry::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = WheelGame::new();

        assert_eq!(game.start_spin("  ", &geometry, &mut rng), Err(SpinRefusal::NoPlayer));
        assert!(!game.is_spinning());

        game.start_spin("Chris Brown", &geometry, &mut rng).unwrap();
        assert!(game.is_spinning());
        assert_eq!(
            game.start_spin("Tom Davis", &geometry, &mut rng),
            Err(SpinRefusal::AlreadySpinning)
        );
        assert_eq!(game.player.as_deref(), Some("Chris Brown"));

        let result = game.resolve_spin(&geometry, &WHEEL_OPTIONS);
        assert!(game.is_spinning());
        game.finish_spin(result.clone());
        assert!(!game.is_spinning());
        assert_eq!(game.last_result, result);
        assert!(game.resolve_spin(&geometry, &WHEEL_OPTIONS).is_none());
    }
}
