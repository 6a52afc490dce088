//! Distance and angle helpers over optional landmarks.
//!
//! Absent points never panic: `distance` reports infinity so threshold checks
//! read as "far apart", and `angle` reports zero.

use crate::types::{Landmark, joint};

/// Euclidean distance in 3D, with a missing `z` treated as 0.
pub fn distance(p1: Option<&Landmark>, p2: Option<&Landmark>) -> f64 {
    let (Some(a), Some(b)) = (p1, p2) else {
        return f64::INFINITY;
    };
    let dz = a.z.unwrap_or(0.0) - b.z.unwrap_or(0.0);
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2) + dz.powi(2)).sqrt()
}

/// Angle in degrees between `origin -> p1` and `origin -> p2`.
pub fn angle(origin: Option<&Landmark>, p1: Option<&Landmark>, p2: Option<&Landmark>) -> f64 {
    let (Some(o), Some(a), Some(b)) = (origin, p1, p2) else {
        return 0.0;
    };
    let v1 = sub(a, o);
    let v2 = sub(b, o);
    let mag1 = norm(v1);
    let mag2 = norm(v2);
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }
    let cos = (dot(v1, v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Wrist to middle-finger MCP distance, the reference length for every
/// hand-size relative threshold. Zero when the skeleton is too short.
pub fn half_hand_size(hand: &[Landmark]) -> f64 {
    match (hand.get(joint::WRIST), hand.get(joint::MIDDLE_MCP)) {
        (Some(wrist), Some(mcp)) => distance(Some(wrist), Some(mcp)),
        _ => 0.0,
    }
}

fn sub(a: &Landmark, b: &Landmark) -> [f64; 3] {
    [
        a.x - b.x,
        a.y - b.y,
        a.z.unwrap_or(0.0) - b.z.unwrap_or(0.0),
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}
