//! Run context: the mutable state of one placement run.
//!
//! Holds the teacher and class grids plus every counter the hard invariants
//! read. All checks and writes go through [`RunContext::check`] and
//! [`RunContext::place`], so a draft cell and an engine block are held to
//! exactly the same rules.
//!
//! Lookup tables are `HashMap`s; nothing iterates them to make a decision.
//! Grids are kept in `BTreeMap`s so output order is stable.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use thiserror::Error;

use crate::models::{
    Catalog, ConstraintKind, ConstraintSet, DemandRecord, EntityKind, GridSlot, Lesson, Level,
    Policy, Slot, WeekCalendar, WeekGrid,
};

/// Why a block does not fit at a given position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The block is empty, leaves the calendar, or spans several days.
    #[error("block is outside the calendar")]
    OutOfRange,
    /// Teacher or class has no grid in this run.
    #[error("teacher or class is not part of this run")]
    UnknownEntity,
    /// Teacher is not eligible for the class level.
    #[error("teacher '{teacher}' is not eligible for level {level}")]
    LevelIneligible {
        /// Teacher.
        teacher: String,
        /// Class level.
        level: Level,
    },
    /// Teacher or class already busy.
    #[error("slot already taken for {0}")]
    Occupied(String),
    /// An unavailable constraint matches.
    #[error("{0} is unavailable")]
    Unavailable(String),
    /// Teacher would exceed its hours at the class level.
    #[error("teacher exceeds its target hours at this level")]
    LevelTarget,
    /// (teacher, class, day) cap reached.
    #[error("teacher-class daily cap of {0} reached")]
    RelationshipCap(u32),
    /// (class, subject, day) cap reached.
    #[error("subject daily cap of {0} reached")]
    SubjectCap(u32),
    /// Class weekly target reached.
    #[error("class weekly target of {0} reached")]
    ClassTarget(u32),
    /// Teacher weekly maximum reached.
    #[error("teacher weekly maximum of {0} reached")]
    TeacherMax(u32),
}

/// Mutable state of one run.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    policy: &'a Policy,
    teacher_grids: BTreeMap<String, WeekGrid>,
    class_grids: BTreeMap<String, WeekGrid>,
    teacher_levels: HashMap<String, Vec<Level>>,
    teacher_caps: HashMap<String, u32>,
    blocked: HashMap<EntityKind, HashMap<String, HashSet<Slot>>>,
    preferred: HashMap<String, BTreeSet<Slot>>,
    level_targets: HashMap<(String, Level), u32>,
    level_actuals: HashMap<(String, Level), u32>,
    pair_daily: HashMap<(String, String, usize), u32>,
    subject_daily: HashMap<(String, String, usize), u32>,
    class_weekly: HashMap<String, u32>,
    teacher_weekly: HashMap<String, u32>,
}

impl<'a> RunContext<'a> {
    /// Builds the context for a demand list.
    ///
    /// Grids are created for every teacher and class the demands name.
    /// Class grids get the non-teaching period of their level; teacher grids
    /// get it only when all of the teacher's levels share the same period.
    pub fn new(
        policy: &'a Policy,
        constraints: &ConstraintSet,
        catalog: &Catalog,
        demands: &[DemandRecord],
    ) -> Self {
        let calendar = &policy.calendar;
        let index = catalog.index();

        let mut teacher_grids = BTreeMap::new();
        let mut class_grids = BTreeMap::new();
        let mut teacher_levels = HashMap::new();
        let mut teacher_caps = HashMap::new();
        let mut level_targets: HashMap<(String, Level), u32> = HashMap::new();

        for d in demands {
            let target = level_targets
                .entry((d.teacher_id.clone(), d.level))
                .or_default();
            *target = target.saturating_add(d.weekly_hours);

            if !teacher_grids.contains_key(&d.teacher_id) {
                let mut grid = WeekGrid::new(&d.teacher_id, calendar);
                let levels = index
                    .teacher(&d.teacher_id)
                    .map(|t| t.levels.clone())
                    .unwrap_or_default();
                if let Some(p) = common_non_teaching_period(policy, &levels) {
                    fill_period(&mut grid, calendar, p, &policy.non_teaching_label);
                }
                if let Some(cap) = index.teacher(&d.teacher_id).and_then(|t| policy.teacher_cap(t)) {
                    teacher_caps.insert(d.teacher_id.clone(), cap);
                }
                teacher_levels.insert(d.teacher_id.clone(), levels);
                teacher_grids.insert(d.teacher_id.clone(), grid);
            }

            if !class_grids.contains_key(&d.class_id) {
                let mut grid = WeekGrid::new(&d.class_id, calendar);
                let level = index.class(&d.class_id).map_or(d.level, |c| c.level);
                if let Some(p) = policy.non_teaching_period(level) {
                    fill_period(&mut grid, calendar, p, &policy.non_teaching_label);
                }
                class_grids.insert(d.class_id.clone(), grid);
            }
        }

        let mut blocked: HashMap<EntityKind, HashMap<String, HashSet<Slot>>> = HashMap::new();
        let mut preferred: HashMap<String, BTreeSet<Slot>> = HashMap::new();
        for (key, entry) in constraints.entries() {
            let Some(slot) = calendar.slot(&key.day, key.period) else {
                continue;
            };
            match entry.kind {
                ConstraintKind::Unavailable => {
                    blocked
                        .entry(key.entity_kind)
                        .or_default()
                        .entry(key.entity_id.clone())
                        .or_default()
                        .insert(slot);
                }
                ConstraintKind::Preferred if key.entity_kind == EntityKind::Subject => {
                    preferred
                        .entry(key.entity_id.clone())
                        .or_default()
                        .insert(slot);
                }
                ConstraintKind::Preferred => {}
            }
        }

        Self {
            policy,
            teacher_grids,
            class_grids,
            teacher_levels,
            teacher_caps,
            blocked,
            preferred,
            level_targets,
            level_actuals: HashMap::new(),
            pair_daily: HashMap::new(),
            subject_daily: HashMap::new(),
            class_weekly: HashMap::new(),
            teacher_weekly: HashMap::new(),
        }
    }

    /// Policy of the run.
    pub fn policy(&self) -> &'a Policy {
        self.policy
    }

    /// Calendar of the run.
    pub fn calendar(&self) -> &'a WeekCalendar {
        &self.policy.calendar
    }

    /// Contiguous slots of a block starting at `start`, if it fits in the day.
    pub fn block_slots(&self, start: Slot, length: u32) -> Option<Vec<Slot>> {
        let end = start.period + length as usize;
        if length == 0 || start.day >= self.calendar().day_count() || end > self.calendar().period_count() {
            return None;
        }
        Some((start.period..end).map(|p| Slot::new(start.day, p)).collect())
    }

    /// Checks every hard invariant for placing `demand` at `slots`.
    ///
    /// `slots` must all lie on one day.
    pub fn check(&self, demand: &DemandRecord, slots: &[Slot]) -> Result<(), Rejection> {
        let calendar = self.calendar();
        let Some(first) = slots.first() else {
            return Err(Rejection::OutOfRange);
        };
        let day = first.day;
        if slots.iter().any(|s| {
            s.day != day || s.day >= calendar.day_count() || s.period >= calendar.period_count()
        }) {
            return Err(Rejection::OutOfRange);
        }
        let len = slots.len() as u32;

        let (Some(teacher_grid), Some(class_grid)) = (
            self.teacher_grids.get(&demand.teacher_id),
            self.class_grids.get(&demand.class_id),
        ) else {
            return Err(Rejection::UnknownEntity);
        };

        if !self.is_eligible(demand) {
            return Err(Rejection::LevelIneligible {
                teacher: demand.teacher_id.clone(),
                level: demand.level,
            });
        }

        for &slot in slots {
            if !teacher_grid.is_free(slot) {
                return Err(Rejection::Occupied(format!("teacher '{}'", demand.teacher_id)));
            }
            if !class_grid.is_free(slot) {
                return Err(Rejection::Occupied(format!("class '{}'", demand.class_id)));
            }
            if self.is_blocked(EntityKind::Subject, &demand.subject_id, slot) {
                return Err(Rejection::Unavailable(format!("subject '{}'", demand.subject_id)));
            }
            if self.is_blocked(EntityKind::Teacher, &demand.teacher_id, slot) {
                return Err(Rejection::Unavailable(format!("teacher '{}'", demand.teacher_id)));
            }
            if self.is_blocked(EntityKind::Class, &demand.class_id, slot) {
                return Err(Rejection::Unavailable(format!("class '{}'", demand.class_id)));
            }
        }

        let level_key = (demand.teacher_id.clone(), demand.level);
        let target = self.level_targets.get(&level_key).copied().unwrap_or(0);
        let actual = self.level_actuals.get(&level_key).copied().unwrap_or(0);
        if actual + len > target {
            return Err(Rejection::LevelTarget);
        }

        let pair_cap = self.policy.relationship_cap(demand.home_room);
        let pair = self
            .pair_daily
            .get(&(demand.teacher_id.clone(), demand.class_id.clone(), day))
            .copied()
            .unwrap_or(0);
        if pair + len > pair_cap {
            return Err(Rejection::RelationshipCap(pair_cap));
        }

        let subject_cap = self.policy.subject_daily_cap;
        if self.subject_day_hours(&demand.class_id, &demand.subject_id, day) + len > subject_cap {
            return Err(Rejection::SubjectCap(subject_cap));
        }

        if let Some(target) = self.policy.class_target(&demand.class_id) {
            if self.class_hours(&demand.class_id) + len > target {
                return Err(Rejection::ClassTarget(target));
            }
        }

        if let Some(&cap) = self.teacher_caps.get(&demand.teacher_id) {
            if self.teacher_hours(&demand.teacher_id) + len > cap {
                return Err(Rejection::TeacherMax(cap));
            }
        }

        Ok(())
    }

    /// Writes a checked block into both grids and bumps the counters.
    ///
    /// Callers run [`RunContext::check`] first.
    pub fn place(&mut self, demand: &DemandRecord, slots: &[Slot]) {
        let Some(day) = slots.first().map(|s| s.day) else {
            return;
        };
        let len = slots.len() as u32;
        let lesson = Lesson::new(&demand.teacher_id, &demand.class_id, &demand.subject_id);

        if let Some(grid) = self.teacher_grids.get_mut(&demand.teacher_id) {
            for &slot in slots {
                grid.set(slot, GridSlot::Lesson(lesson.clone()));
            }
        }
        if let Some(grid) = self.class_grids.get_mut(&demand.class_id) {
            for &slot in slots {
                grid.set(slot, GridSlot::Lesson(lesson.clone()));
            }
        }

        *self
            .level_actuals
            .entry((demand.teacher_id.clone(), demand.level))
            .or_default() += len;
        *self
            .pair_daily
            .entry((demand.teacher_id.clone(), demand.class_id.clone(), day))
            .or_default() += len;
        *self
            .subject_daily
            .entry((demand.class_id.clone(), demand.subject_id.clone(), day))
            .or_default() += len;
        *self.class_weekly.entry(demand.class_id.clone()).or_default() += len;
        *self.teacher_weekly.entry(demand.teacher_id.clone()).or_default() += len;
    }

    /// Checks and places in one step.
    pub fn try_place(&mut self, demand: &DemandRecord, slots: &[Slot]) -> Result<(), Rejection> {
        self.check(demand, slots)?;
        self.place(demand, slots);
        Ok(())
    }

    /// Whether the demand's teacher may teach at the demand's level.
    pub fn is_eligible(&self, demand: &DemandRecord) -> bool {
        self.teacher_levels
            .get(&demand.teacher_id)
            .is_some_and(|levels| levels.contains(&demand.level))
    }

    /// Whether an unavailable constraint covers `slot` for an entity.
    pub fn is_blocked(&self, kind: EntityKind, id: &str, slot: Slot) -> bool {
        self.blocked
            .get(&kind)
            .and_then(|m| m.get(id))
            .is_some_and(|s| s.contains(&slot))
    }

    /// Preferred slots of a subject, in calendar order.
    pub fn preferred_slots(&self, subject_id: &str) -> Vec<Slot> {
        self.preferred
            .get(subject_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Hours a teacher gives a class on a day.
    pub fn pair_day_hours(&self, teacher_id: &str, class_id: &str, day: usize) -> u32 {
        self.pair_daily
            .get(&(teacher_id.to_string(), class_id.to_string(), day))
            .copied()
            .unwrap_or(0)
    }

    /// Hours of a subject a class has on a day.
    pub fn subject_day_hours(&self, class_id: &str, subject_id: &str, day: usize) -> u32 {
        self.subject_daily
            .get(&(class_id.to_string(), subject_id.to_string(), day))
            .copied()
            .unwrap_or(0)
    }

    /// Hours placed for a class this week.
    pub fn class_hours(&self, class_id: &str) -> u32 {
        self.class_weekly.get(class_id).copied().unwrap_or(0)
    }

    /// Hours placed for a teacher this week.
    pub fn teacher_hours(&self, teacher_id: &str) -> u32 {
        self.teacher_weekly.get(teacher_id).copied().unwrap_or(0)
    }

    /// Teacher grid.
    pub fn teacher_grid(&self, teacher_id: &str) -> Option<&WeekGrid> {
        self.teacher_grids.get(teacher_id)
    }

    /// Class grid.
    pub fn class_grid(&self, class_id: &str) -> Option<&WeekGrid> {
        self.class_grids.get(class_id)
    }

    /// Consumes the context, returning `(teacher grids, class grids)`.
    pub fn into_grids(self) -> (BTreeMap<String, WeekGrid>, BTreeMap<String, WeekGrid>) {
        (self.teacher_grids, self.class_grids)
    }
}

fn common_non_teaching_period(policy: &Policy, levels: &[Level]) -> Option<u32> {
    let mut periods = levels.iter().map(|&l| policy.non_teaching_period(l));
    let first = periods.next()??;
    periods.all(|p| p == Some(first)).then_some(first)
}

fn fill_period(grid: &mut WeekGrid, calendar: &WeekCalendar, period: u32, label: &str) {
    let Some(p) = calendar.period_index(period) else {
        return;
    };
    for d in 0..calendar.day_count() {
        grid.set(Slot::new(d, p), GridSlot::fixed(label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassGroup, Constraint, Teacher};

    fn fixture() -> (Policy, Catalog, Vec<DemandRecord>) {
        let policy = Policy::default().with_teacher_max_hours("T1", 6);
        let catalog = Catalog::new()
            .with_teacher(Teacher::new("T1", Level::Middle))
            .with_teacher(Teacher::new("T2", Level::Primary).with_level(Level::Middle))
            .with_class(ClassGroup::new("7A", Level::Middle))
            .with_class(ClassGroup::new("7B", Level::Middle));
        let demands = vec![
            DemandRecord::new("7A", "MATH", "T1", Level::Middle, 4),
            DemandRecord::new("7B", "MATH", "T1", Level::Middle, 4),
            DemandRecord::new("7A", "ART", "T2", Level::Middle, 2),
        ];
        (policy, catalog, demands)
    }

    #[test]
    fn test_non_teaching_prefill() {
        let (policy, catalog, demands) = fixture();
        let ctx = RunContext::new(&policy, &ConstraintSet::new(), &catalog, &demands);

        // Middle lunch is period 6
        let class = ctx.class_grid("7A").unwrap();
        assert_eq!(class.fixed_count(), 5);
        assert!(class.at("Monday", 6).unwrap().is_fixed());
        assert_eq!(ctx.teacher_grid("T1").unwrap().fixed_count(), 5);
        // T2 spans primary (5) and middle (6): nothing common
        assert_eq!(ctx.teacher_grid("T2").unwrap().fixed_count(), 0);
    }

    #[test]
    fn test_no_double_booking() {
        let (policy, catalog, demands) = fixture();
        let mut ctx = RunContext::new(&policy, &ConstraintSet::new(), &catalog, &demands);
        let slots = [Slot::new(0, 0)];

        ctx.try_place(&demands[0], &slots).unwrap();
        // Same teacher, other class
        assert!(matches!(ctx.check(&demands[1], &slots), Err(Rejection::Occupied(_))));
        // Same class, other teacher
        assert!(matches!(ctx.check(&demands[2], &slots), Err(Rejection::Occupied(_))));
        assert_eq!(ctx.teacher_hours("T1"), 1);
        assert_eq!(ctx.class_hours("7A"), 1);
    }

    #[test]
    fn test_unavailable_and_level() {
        let (policy, catalog, demands) = fixture();
        let constraints = ConstraintSet::new()
            .with(Constraint::teacher_unavailable("T1", "Monday", 1))
            .with(Constraint::subject_unavailable("ART", "Monday", 2));
        let ctx = RunContext::new(&policy, &constraints, &catalog, &demands);

        assert!(matches!(
            ctx.check(&demands[0], &[Slot::new(0, 0)]),
            Err(Rejection::Unavailable(_))
        ));
        assert!(matches!(
            ctx.check(&demands[2], &[Slot::new(0, 1)]),
            Err(Rejection::Unavailable(_))
        ));
        assert!(ctx.check(&demands[0], &[Slot::new(0, 1)]).is_ok());

        let wrong_level = DemandRecord::new("7A", "MATH", "T1", Level::Primary, 1);
        assert!(matches!(
            ctx.check(&wrong_level, &[Slot::new(1, 0)]),
            Err(Rejection::LevelIneligible { .. })
        ));
    }

    #[test]
    fn test_daily_caps() {
        let (policy, catalog, demands) = fixture();
        let mut ctx = RunContext::new(&policy, &ConstraintSet::new(), &catalog, &demands);

        ctx.try_place(&demands[0], &[Slot::new(0, 0), Slot::new(0, 1)]).unwrap();
        assert_eq!(ctx.subject_day_hours("7A", "MATH", 0), 2);
        assert_eq!(
            ctx.check(&demands[0], &[Slot::new(0, 2)]),
            Err(Rejection::SubjectCap(2))
        );
        assert!(ctx.check(&demands[0], &[Slot::new(1, 2)]).is_ok());
    }

    #[test]
    fn test_relationship_cap() {
        let (policy, catalog, _) = fixture();
        let policy = policy.with_daily_caps(6, 2, 4);
        let demands = vec![
            DemandRecord::new("7A", "MATH", "T1", Level::Middle, 2),
            DemandRecord::new("7A", "SCI", "T1", Level::Middle, 2),
        ];
        let mut ctx = RunContext::new(&policy, &ConstraintSet::new(), &catalog, &demands);
        ctx.try_place(&demands[0], &[Slot::new(0, 0), Slot::new(0, 1)]).unwrap();
        assert_eq!(ctx.pair_day_hours("T1", "7A", 0), 2);
        assert_eq!(
            ctx.check(&demands[1], &[Slot::new(0, 2)]),
            Err(Rejection::RelationshipCap(2))
        );
    }

    #[test]
    fn test_weekly_limits() {
        let (policy, catalog, demands) = fixture();
        let policy = policy.with_class_target("7B", 1);
        let mut ctx = RunContext::new(&policy, &ConstraintSet::new(), &catalog, &demands);

        for d in 0..2 {
            ctx.try_place(&demands[0], &[Slot::new(d, 0), Slot::new(d, 1)])
                .unwrap();
        }
        ctx.try_place(&demands[1], &[Slot::new(3, 0)]).unwrap();
        assert_eq!(ctx.teacher_hours("T1"), 5);
        assert_eq!(
            ctx.check(&demands[1], &[Slot::new(4, 0)]),
            Err(Rejection::ClassTarget(1))
        );
        assert_eq!(
            ctx.check(&demands[0], &[Slot::new(2, 0), Slot::new(2, 1)]),
            Err(Rejection::TeacherMax(6))
        );
    }

    #[test]
    fn test_block_slots() {
        let (policy, catalog, demands) = fixture();
        let ctx = RunContext::new(&policy, &ConstraintSet::new(), &catalog, &demands);
        assert_eq!(
            ctx.block_slots(Slot::new(2, 8), 2),
            Some(vec![Slot::new(2, 8), Slot::new(2, 9)])
        );
        assert!(ctx.block_slots(Slot::new(2, 9), 2).is_none());
        assert!(ctx.block_slots(Slot::new(5, 0), 1).is_none());
        assert_eq!(ctx.check(&demands[0], &[]), Err(Rejection::OutOfRange));
    }
}
