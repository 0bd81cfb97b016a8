//! Animation clips and per-bone keyframe tracks
//!
//! Channels are bound to bones by name. The rotation/position/scale key
//! sequences of a track keep their own timestamps until [`KeyframeTrack::keyframes`]
//! merges them into one timeline.

use glam::{Quat, Vec3};
use hashbrown::HashMap;
use std::collections::BTreeMap;

use crate::config::KeyframePolicy;
use crate::error::ConvertError;
use crate::scene::{QuatKey, Scene, VectorKey};
use crate::skeleton::Bone;

/// Timestamps closer than this are the same key time
pub const TIME_EPSILON: f64 = 1e-6;

/// Tracks of one bone, keyed by clip index
pub type BoneTracks = BTreeMap<usize, KeyframeTrack>;

/// Clip metadata. Keys live on the bones.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Duration in ticks
    pub duration: f64,
    pub ticks_per_second: f64,
}

/// Bone transform (TRS)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trs {
    /// Position/translation
    pub position: [f32; 3],
    /// Quaternion rotation [x, y, z, w]
    pub rotation: [f32; 4],
    /// Scale
    pub scale: [f32; 3],
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0], // Identity quaternion
            scale: [1.0, 1.0, 1.0],
        }
    }
}

/// Key sequences of one bone in one clip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyframeTrack {
    pub rotation_keys: Vec<QuatKey>,
    pub position_keys: Vec<VectorKey>,
    pub scale_keys: Vec<VectorKey>,
}

/// One sample of a merged timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Ticks
    pub time: f64,
    pub transform: Trs,
}

/// Bind every clip's channels to bones by name
///
/// Returns the clips and, per bone index, that bone's tracks.
pub fn collect_tracks(
    scene: &Scene,
    bone_lookup: &HashMap<&str, usize>,
    bone_count: usize,
) -> (Vec<AnimationClip>, Vec<BoneTracks>) {
    let mut tracks: Vec<BoneTracks> = vec![BoneTracks::new(); bone_count];

    if !scene.animations.is_empty() {
        tracing::info!("Animations found; loading {} clips", scene.animations.len());
    }

    let clips = scene
        .animations
        .iter()
        .enumerate()
        .map(|(clip_index, animation)| {
            tracing::info!(
                "Animation '{}': {} ticks at {} ticks/s, {} channels",
                animation.name,
                animation.duration,
                animation.ticks_per_second,
                animation.channels.len()
            );

            for channel in &animation.channels {
                let Some(&bone) = bone_lookup.get(channel.node_name.as_str()) else {
                    tracing::debug!(
                        "Animation '{}': skipping channel for non-bone node '{}'",
                        animation.name,
                        channel.node_name
                    );
                    continue;
                };

                let track = KeyframeTrack {
                    rotation_keys: channel.rotation_keys.clone(),
                    position_keys: channel.position_keys.clone(),
                    scale_keys: channel.scale_keys.clone(),
                };
                if tracks[bone].insert(clip_index, track).is_some() {
                    tracing::warn!(
                        "Animation '{}': duplicate channel for bone '{}', keeping the last one",
                        animation.name,
                        channel.node_name
                    );
                }
            }

            AnimationClip {
                name: animation.name.clone(),
                duration: animation.duration,
                ticks_per_second: animation.ticks_per_second,
            }
        })
        .collect();

    (clips, tracks)
}

/// Keyframes of every bone for one clip, in bone-index order
pub fn clip_keyframes(
    bones: &[Bone],
    clip_index: usize,
    clip: &AnimationClip,
    policy: KeyframePolicy,
) -> Result<Vec<Vec<Keyframe>>, ConvertError> {
    bones
        .iter()
        .map(|bone| match bone.tracks.get(&clip_index) {
            Some(track) => track.keyframes(&bone.name, &clip.name, policy, &bone.local),
            None => Ok(Vec::new()),
        })
        .collect()
}

impl KeyframeTrack {
    pub fn is_empty(&self) -> bool {
        self.rotation_keys.is_empty() && self.position_keys.is_empty() && self.scale_keys.is_empty()
    }

    /// Merge the three key sequences into one timeline
    ///
    /// `rest` fills in sequences without keys when resampling.
    pub fn keyframes(
        &self,
        bone: &str,
        clip: &str,
        policy: KeyframePolicy,
        rest: &Trs,
    ) -> Result<Vec<Keyframe>, ConvertError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        match policy {
            KeyframePolicy::Strict => self.zip_aligned(bone, clip),
            KeyframePolicy::Resample => Ok(self.resample(rest)),
        }
    }

    fn zip_aligned(&self, bone: &str, clip: &str) -> Result<Vec<Keyframe>, ConvertError> {
        let misaligned = |detail: String| ConvertError::MisalignedKeyframes {
            bone: bone.to_string(),
            clip: clip.to_string(),
            detail,
        };

        let (r, p, s) = (
            self.rotation_keys.len(),
            self.position_keys.len(),
            self.scale_keys.len(),
        );
        if r != p || p != s {
            return Err(misaligned(format!(
                "{} rotation keys, {} position keys, {} scale keys",
                r, p, s
            )));
        }

        self.rotation_keys
            .iter()
            .zip(&self.position_keys)
            .zip(&self.scale_keys)
            .enumerate()
            .map(|(i, ((rot, pos), scl))| {
                if (pos.time - rot.time).abs() > TIME_EPSILON
                    || (scl.time - rot.time).abs() > TIME_EPSILON
                {
                    return Err(misaligned(format!(
                        "key {}: rotation at {}, position at {}, scale at {}",
                        i, rot.time, pos.time, scl.time
                    )));
                }
                Ok(Keyframe {
                    time: rot.time,
                    transform: Trs {
                        position: pos.value,
                        rotation: rot.value,
                        scale: scl.value,
                    },
                })
            })
            .collect()
    }

    fn resample(&self, rest: &Trs) -> Vec<Keyframe> {
        let mut times: Vec<f64> = self
            .rotation_keys
            .iter()
            .map(|k| k.time)
            .chain(self.position_keys.iter().map(|k| k.time))
            .chain(self.scale_keys.iter().map(|k| k.time))
            .collect();
        times.sort_by(f64::total_cmp);
        times.dedup_by(|later, kept| (*later - *kept).abs() <= TIME_EPSILON);

        times
            .into_iter()
            .map(|time| Keyframe {
                time,
                transform: Trs {
                    position: sample_vec3(&self.position_keys, time).unwrap_or(rest.position),
                    rotation: sample_quat(&self.rotation_keys, time).unwrap_or(rest.rotation),
                    scale: sample_vec3(&self.scale_keys, time).unwrap_or(rest.scale),
                },
            })
            .collect()
    }
}

/// Index pair bracketing `time`, or a single index when clamped or exact
fn bracket(times: impl Fn(usize) -> f64, len: usize, time: f64) -> Option<(usize, usize, f32)> {
    if len == 0 {
        return None;
    }
    let next = (0..len).position(|i| times(i) > time + TIME_EPSILON).unwrap_or(len);
    if next == 0 {
        return Some((0, 0, 0.0));
    }
    let prev = next - 1;
    if next == len || (time - times(prev)).abs() <= TIME_EPSILON {
        return Some((prev, prev, 0.0));
    }
    let factor = (time - times(prev)) / (times(next) - times(prev));
    Some((prev, next, factor as f32))
}

fn sample_vec3(keys: &[VectorKey], time: f64) -> Option<[f32; 3]> {
    let (a, b, factor) = bracket(|i| keys[i].time, keys.len(), time)?;
    if a == b {
        return Some(keys[a].value);
    }
    let v0 = Vec3::from(keys[a].value);
    let v1 = Vec3::from(keys[b].value);
    Some(v0.lerp(v1, factor).to_array())
}

fn sample_quat(keys: &[QuatKey], time: f64) -> Option<[f32; 4]> {
    let (a, b, factor) = bracket(|i| keys[i].time, keys.len(), time)?;
    if a == b {
        return Some(keys[a].value);
    }
    let q0 = Quat::from_array(keys[a].value).normalize();
    let q1 = Quat::from_array(keys[b].value).normalize();
    Some(q0.slerp(q1, factor).to_array())
}
