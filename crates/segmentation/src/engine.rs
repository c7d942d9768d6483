//! Core segmentation engine: scores users and evaluates automated segment
//! membership against an owned catalog.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reward_core::config::SegmentationConfig;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::behavior::{BehaviorMetricSnapshot, BehaviorMetricUpdate, BehaviorScores};
use crate::catalog::{default_catalog, AutomatedSegment, BehaviorPattern, Catalog, SegmentUpdate};
use crate::rules::evaluate_segment;

/// Owns the pattern/segment catalog and the latest snapshot per user.
/// Membership is recomputed on every call and never cached.
pub struct BehaviorSegmentationEngine {
    patterns: DashMap<Uuid, BehaviorPattern>,
    segments: DashMap<Uuid, AutomatedSegment>,
    snapshots: DashMap<String, BehaviorMetricSnapshot>,
    max_tracked_users: usize,
}

impl BehaviorSegmentationEngine {
    pub fn new(config: &SegmentationConfig) -> Self {
        let engine = Self {
            max_tracked_users: config.max_tracked_users,
            ..Self::empty()
        };
        if config.seed_default_catalog {
            engine.load_catalog(default_catalog());
        }
        info!(
            patterns = engine.patterns.len(),
            segments = engine.segments.len(),
            max_tracked_users = config.max_tracked_users,
            "Segmentation engine initialized"
        );
        engine
    }

    /// Engine with no patterns, no segments and no user bound.
    pub fn empty() -> Self {
        Self {
            patterns: DashMap::new(),
            segments: DashMap::new(),
            snapshots: DashMap::new(),
            max_tracked_users: 0,
        }
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let engine = Self::empty();
        engine.load_catalog(catalog);
        engine
    }

    fn load_catalog(&self, catalog: Catalog) {
        for pattern in catalog.patterns {
            self.patterns.insert(pattern.id, pattern);
        }
        for segment in catalog.segments {
            self.segments.insert(segment.id, segment);
        }
    }

    // ─── Catalog ────────────────────────────────────────────────────────────

    pub fn create_pattern(&self, pattern: BehaviorPattern) -> Uuid {
        let id = pattern.id;
        info!(pattern_id = %id, name = %pattern.name, "Behavior pattern created");
        self.patterns.insert(id, pattern);
        id
    }

    pub fn create_segment(&self, segment: AutomatedSegment) -> Uuid {
        let id = segment.id;
        info!(
            segment_id = %id,
            name = %segment.name,
            rules = segment.rules.len(),
            "Automated segment created"
        );
        metrics::counter!("segmentation.segments_created").increment(1);
        self.segments.insert(id, segment);
        id
    }

    /// Merge `update` into the segment and stamp `last_updated`.
    /// Returns `None` if no segment has this id.
    pub fn update_segment(&self, id: &Uuid, update: SegmentUpdate) -> Option<AutomatedSegment> {
        let mut segment = self.segments.get_mut(id)?;
        update.apply(&mut segment, Utc::now());
        debug!(segment_id = %id, active = segment.is_active, "Automated segment updated");
        Some(segment.clone())
    }

    pub fn set_segment_active(&self, id: &Uuid, is_active: bool) -> Option<AutomatedSegment> {
        self.update_segment(id, SegmentUpdate::active(is_active))
    }

    pub fn get_segment(&self, id: &Uuid) -> Option<AutomatedSegment> {
        self.segments.get(id).map(|s| s.clone())
    }

    pub fn get_pattern(&self, id: &Uuid) -> Option<BehaviorPattern> {
        self.patterns.get(id).map(|p| p.clone())
    }

    /// All segments, highest priority first, ties broken by name.
    pub fn list_segments(&self) -> Vec<AutomatedSegment> {
        let mut segments: Vec<AutomatedSegment> =
            self.segments.iter().map(|s| s.value().clone()).collect();
        sort_segments(&mut segments);
        segments
    }

    pub fn list_patterns(&self) -> Vec<BehaviorPattern> {
        let mut patterns: Vec<BehaviorPattern> =
            self.patterns.iter().map(|p| p.value().clone()).collect();
        patterns.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        patterns
    }

    /// Resolve a segment's pattern references, skipping ids that are unknown.
    pub fn patterns_for_segment(&self, id: &Uuid) -> Vec<BehaviorPattern> {
        let Some(segment) = self.get_segment(id) else {
            return Vec::new();
        };
        segment
            .patterns
            .iter()
            .filter_map(|pid| self.get_pattern(pid))
            .collect()
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    /// Merge the partial snapshot into the stored one, rescore the user and
    /// return the ids of every active segment they belong to.
    pub fn analyze_user_behavior(&self, user_id: &str, update: BehaviorMetricUpdate) -> Vec<Uuid> {
        self.analyze_user_behavior_at(user_id, update, Utc::now())
    }

    pub fn analyze_user_behavior_at(
        &self,
        user_id: &str,
        update: BehaviorMetricUpdate,
        now: DateTime<Utc>,
    ) -> Vec<Uuid> {
        let mut snapshot = self
            .snapshots
            .get(user_id)
            .map(|s| s.clone())
            .unwrap_or_default();
        snapshot.merge(update, now);
        snapshot.refresh_scores();

        let matches: Vec<Uuid> = self
            .active_segments()
            .iter()
            .filter(|segment| evaluate_segment(&snapshot, segment))
            .map(|segment| segment.id)
            .collect();

        metrics::counter!("segmentation.users_analyzed").increment(1);
        metrics::counter!("segmentation.segment_matches").increment(matches.len() as u64);
        debug!(
            user_id = %user_id,
            scores = ?snapshot.behavior_scores,
            matched = matches.len(),
            "User behavior analyzed"
        );

        self.store_snapshot(user_id, snapshot);
        matches
    }

    fn store_snapshot(&self, user_id: &str, snapshot: BehaviorMetricSnapshot) {
        let at_capacity = self.max_tracked_users > 0
            && self.snapshots.len() >= self.max_tracked_users
            && !self.snapshots.contains_key(user_id);
        if at_capacity {
            warn!(
                user_id = %user_id,
                limit = self.max_tracked_users,
                "Tracked user limit reached, snapshot not stored"
            );
            return;
        }
        self.snapshots.insert(user_id.to_string(), snapshot);
    }

    pub fn user_snapshot(&self, user_id: &str) -> Option<BehaviorMetricSnapshot> {
        self.snapshots.get(user_id).map(|s| s.clone())
    }

    pub fn user_scores(&self, user_id: &str) -> Option<BehaviorScores> {
        self.snapshots.get(user_id).map(|s| s.behavior_scores)
    }

    pub fn tracked_users(&self) -> usize {
        self.snapshots.len()
    }

    /// Re-evaluate every stored snapshot and write each segment's recipient
    /// count. Inactive segments are reset to zero.
    pub fn refresh_recipient_counts(&self) -> HashMap<Uuid, u64> {
        let snapshots: Vec<BehaviorMetricSnapshot> =
            self.snapshots.iter().map(|s| s.value().clone()).collect();
        let segments: Vec<AutomatedSegment> =
            self.segments.iter().map(|s| s.value().clone()).collect();

        let mut counts = HashMap::with_capacity(segments.len());
        for segment in &segments {
            let count = if segment.is_active {
                snapshots
                    .iter()
                    .filter(|s| evaluate_segment(s, segment))
                    .count() as u64
            } else {
                0
            };
            counts.insert(segment.id, count);
        }

        let now = Utc::now();
        for (id, count) in &counts {
            if let Some(mut segment) = self.segments.get_mut(id) {
                segment.recipient_count = *count;
                segment.last_updated = now;
            }
        }

        info!(
            users = snapshots.len(),
            segments = counts.len(),
            "Segment recipient counts refreshed"
        );
        counts
    }

    fn active_segments(&self) -> Vec<AutomatedSegment> {
        let mut active: Vec<AutomatedSegment> = self
            .segments
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.value().clone())
            .collect();
        sort_segments(&mut active);
        active
    }
}

fn sort_segments(segments: &mut [AutomatedSegment]) {
    segments.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
}

impl Default for BehaviorSegmentationEngine {
    fn default() -> Self {
        Self::new(&SegmentationConfig::default())
    }
}
