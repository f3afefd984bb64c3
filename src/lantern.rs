use glam::Vec3;
use log::{debug, info};

/// Radius of the spherical trigger volume around each lantern.
const TRIGGER_RADIUS: f32 = 1.2;
/// Default spark lifetime in ticks, overridable from the stage manifest.
pub const DEFAULT_SPARK_TICKS: u32 = 1200;

/// The player-carried flame. Lantern contact keeps it alive; once it burns
/// out the run is over.
#[derive(Debug, Clone, Copy)]
pub struct Spark {
    lit: bool,
    remaining: u32,
    duration: u32,
}

impl Spark {
    pub fn new(duration: u32) -> Self {
        Self {
            lit: true,
            remaining: duration,
            duration,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Refills the timer without changing the lit flag of any lantern.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.lit = true;
    }

    /// Burns one tick. Returns true on the tick the spark goes out.
    pub fn tick(&mut self) -> bool {
        if !self.lit {
            return false;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            self.lit = false;
            return true;
        }
        false
    }
}

/// One lantern instance. `lit` transitions false to true exactly once and
/// is never re-extinguished.
#[derive(Debug, Clone, Copy)]
pub struct Lantern {
    pub position: Vec3,
    lit: bool,
}

impl Lantern {
    fn new(position: Vec3) -> Self {
        Self {
            position,
            lit: false,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn light(&mut self) {
        self.lit = true;
    }
}

/// All lanterns in the stage, cloned from one template onto the holder
/// positions the environment mesh provides. Overlap is detected as an
/// intersection-enter event: it fires once on entry, not continuously
/// while the player stands inside the trigger volume.
#[derive(Debug)]
pub struct LanternField {
    lanterns: Vec<Lantern>,
    inside: Vec<bool>,
    lit_count: u32,
}

impl LanternField {
    pub fn from_holders(holders: &[Vec3]) -> Self {
        let lanterns = holders.iter().copied().map(Lantern::new).collect::<Vec<_>>();
        let inside = vec![false; lanterns.len()];
        Self {
            lanterns,
            inside,
            lit_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.lanterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanterns.is_empty()
    }

    pub fn lit_count(&self) -> u32 {
        self.lit_count
    }

    pub fn lanterns(&self) -> &[Lantern] {
        &self.lanterns
    }

    /// Lights the first lantern unconditionally, the session-start spark
    /// the player begins next to.
    pub fn light_first(&mut self) {
        if let Some(first) = self.lanterns.first_mut() {
            if !first.is_lit() {
                first.light();
                self.lit_count += 1;
            }
        }
    }

    /// Evaluates enter-trigger overlaps for this tick. A newly entered
    /// unlit lantern lights up when the spark is alive; an already-lit one
    /// only refreshes the spark.
    pub fn update(&mut self, player_position: Vec3, spark: &mut Spark) {
        for (index, lantern) in self.lanterns.iter_mut().enumerate() {
            let overlapping =
                lantern.position.distance_squared(player_position) <= TRIGGER_RADIUS * TRIGGER_RADIUS;
            if overlapping && !self.inside[index] {
                if !lantern.is_lit() && spark.is_lit() {
                    lantern.light();
                    self.lit_count += 1;
                    spark.reset();
                    info!("lantern {index} lit ({} total)", self.lit_count);
                } else if lantern.is_lit() {
                    spark.reset();
                    debug!("lantern {index} refreshed the spark");
                }
            }
            self.inside[index] = overlapping;
        }
    }
}
