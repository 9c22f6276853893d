//! Arena rules and fixed planner tuning parameters.
//!
//! Posture-dependent weights live in [`crate::config`]; the values here are
//! rules of the arena itself or geometry constants that are not tuned.

/// Maximum distance a unit can travel in one cycle.
pub const MAX_SPEED: u32 = 7;

/// `MAX_SPEED` as a float, for geometry.
pub const MAX_SPEED_F: f64 = MAX_SPEED as f64;

/// Radius of a single mobile unit.
pub const UNIT_RADIUS: f64 = 0.5;

/// Starting (and maximum) unit health.
pub const BASE_UNIT_HEALTH: f64 = 255.0;

/// Weapon reach from a unit's centre.
pub const WEAPON_RADIUS: f64 = 5.0;

/// Damage dealt per cycle by one unit, split across everything in reach.
pub const WEAPON_DAMAGE: f64 = 64.0;

/// Distance from a node's edge within which a unit may dock.
pub const DOCK_RADIUS: f64 = 4.0;

/// Can engage this cycle after moving.
pub const MOVE_AND_FIRE_RADIUS: f64 = WEAPON_RADIUS + MAX_SPEED_F;

/// Potential to clash next cycle.
pub const NEARBY_RADIUS: f64 = WEAPON_RADIUS + 2.0 * MAX_SPEED_F;

/// Units closer than this to each other can be clustered.
pub const CLUMP_RADIUS: f64 = 1.3;

/// Nearest-enemy tracking reach, in cycles of travel.
pub const NEAREST_ENEMY_TURNS: f64 = 11.0;

/// Hostiles further than this many cycles from a docked unit are no threat to it.
pub const DOCK_THREAT_TURNS: f64 = 10.0;

// --- Navigation ---

/// Default extra clearance added to combined radii.
pub const NAV_FUDGE: f64 = 0.2;

/// Look-ahead as a multiple of the commanded speed.
pub const LOOK_AHEAD_FACTOR: f64 = 2.5;

/// Below this distance to the standoff point no movement is commanded.
pub const ARRIVAL_TOLERANCE: f64 = 1.0;

/// Standoff from a resource node's edge.
pub const NODE_STANDOFF: f64 = 1.0;

/// Standoff from a friendly unit.
pub const FRIENDLY_STANDOFF: f64 = 1.0;

/// Standoff from a docked hostile.
pub const DOCKED_HOSTILE_STANDOFF: f64 = 1.5;

/// Standoff from an undocked hostile when simply approaching.
pub const HOSTILE_STANDOFF: f64 = 2.0;

/// Standoff from an undocked hostile when engaging (and for clusters).
pub const COMBAT_STANDOFF: f64 = 4.5;

/// Standoff for clusters approaching a docked hostile.
pub const CLUSTER_DOCKED_STANDOFF: f64 = 2.0;

/// Two headings within this many degrees are parallel (or opposite).
pub const PARALLEL_TOLERANCE_DEG: f64 = 20.0;

/// Head-on evasion only when the other body's end point is within this of our bearing.
pub const HEAD_ON_BEARING_DEG: f64 = 30.0;

/// Sideways offset from a crossing point when dodging a moving friend.
pub const CROSSING_OFFSET: f64 = 1.3;

/// Corner re-aim ignores corners this close to the target.
pub const CORNER_TARGET_EXCLUSION: f64 = 1.3 * MAX_SPEED_F;

// --- Dock intercept ---

/// Hostiles further than this from our dock are intercepted rather than chased.
pub const DOCK_INTERCEPT_RANGE: f64 = 8.0 * MAX_SPEED_F;

/// Fleets at or below this size guard docks closely.
pub const SMALL_FLEET: usize = 5;

// --- Mid-map ---

/// "Near the centre" radius for combat-ratio amplification and clustering.
pub const MID_MAP_RADIUS: f64 = 3.5 * MAX_SPEED_F;

// --- Clusters ---

/// Added to the furthest member distance to form a cluster's radius.
pub const CLUSTER_RADIUS_MARGIN: f64 = 1.2;

/// Spacing between formation slots.
pub const CLUSTER_SPACING: f64 = UNIT_RADIUS + 0.5;

// --- Utility ---

/// Candidate cap when the fleet is large.
pub const LARGE_FLEET_CANDIDATES: usize = 3;

/// Candidate cap otherwise.
pub const DEFAULT_CANDIDATES: usize = 15;

/// Undocked unit count at which the candidate cap shrinks.
pub const LARGE_FLEET: usize = 100;

/// Bonus for a node others are already heading to or docked at.
pub const CONTESTED_NODE_BONUS: f64 = 1.1;

/// Bonus on docked hostiles when the scoring unit is clustered.
pub const CLUSTER_DOCKED_BONUS: f64 = 1.5;

// --- Saturation ---

/// Combat-ratio multiplier for targets near mid-map.
pub const MID_MAP_RATIO_FACTOR: f64 = 1.5;

/// Combat-ratio multiplier for the fleet-wide focus target.
pub const FOCUS_RATIO_FACTOR: f64 = 10.0;

/// Combat-ratio multiplier for docked hostiles.
pub const DOCKED_RATIO_FACTOR: f64 = 3.0;

/// Combat ratio used when deciding whether a dock threat is covered.
pub const DOCK_CHECK_RATIO: f64 = 0.5;

/// Combat ratio at which the fallback target counts as saturated.
pub const FALLBACK_COMBAT_RATIO: f64 = 20.0;

// --- Skirmish ---

/// Hostiles this close to each other fight as one clump.
pub const CLUMPED_HOSTILE_RADIUS: f64 = 2.0;

/// Skirmishing stops once our undocked health leads by this much.
pub const SKIRMISH_HEALTH_ADVANTAGE: f64 = 2000.0;

/// Health lead limit in the multi-opponent posture.
pub const MULTI_OPPONENT_HEALTH_ADVANTAGE: f64 = 2500.0;

/// Ready partners that justify engaging regardless of health totals.
pub const ENGAGE_PARTNERS: usize = 2;

/// Nearby friends per threat that make running unnecessary.
pub const RUN_FRIEND_RATIO: f64 = 1.25;

/// Escape bearing offset either side of straight back, in degrees.
pub const ESCAPE_SPREAD_DEG: f64 = 145.0;

/// Escape points lie this far out.
pub const ESCAPE_DISTANCE: f64 = MAX_SPEED_F + 1.0;

/// Extra reach added when stepping into or out of a hostile's zone.
pub const ZONE_MARGIN: f64 = 0.5;

/// Smallest step worth commanding when zoning.
pub const MIN_ZONE_STEP: f64 = 1.1;

/// Screening position offset from a guarded dock.
pub const DOCK_SCREEN_OFFSET: f64 = 1.2;

/// Early rush cycles keep out of move-and-fire reach entirely.
pub const EARLY_RUSH_TURNS: u32 = 15;

/// From this cycle on, zoning out also commits to the clumped hostiles.
pub const CLUMPED_COMMIT_TURN: u32 = 20;

/// Engagers with more nearby friends than this aim past the hostile.
pub const CROWDED_ENGAGEMENT: usize = 4;

/// Near mid-map, rounding an enemy uses a tighter tangent.
pub const ROUND_MID_MAP_RADIUS: f64 = 2.5 * MAX_SPEED_F;

/// Lateral step used for the tight tangent near mid-map.
pub const ROUND_MID_MAP_STEP: f64 = 3.0;
