use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

/// Chooses one remark out of a pool.
pub trait RemarkPicker {
    fn pick<'a>(&mut self, pool: &[&'a str]) -> &'a str;
}

/// Cycles through pools in order. Same input sequence, same output.
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: usize,
}

impl RemarkPicker for RoundRobin {
    fn pick<'a>(&mut self, pool: &[&'a str]) -> &'a str {
        if pool.is_empty() {
            return "";
        }
        let remark = pool[self.next % pool.len()];
        self.next = self.next.wrapping_add(1);
        remark
    }
}

pub struct Seeded {
    rng: StdRng,
}

impl Seeded {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RemarkPicker for Seeded {
    fn pick<'a>(&mut self, pool: &[&'a str]) -> &'a str {
        pool.choose(&mut self.rng).copied().unwrap_or("")
    }
}

/// One picker per remark pool, so each pool rotates from its own start.
pub struct RemarkPickers {
    pub teacher: Box<dyn RemarkPicker>,
    pub principal: Box<dyn RemarkPicker>,
}

impl RemarkPickers {
    pub fn round_robin() -> Self {
        Self {
            teacher: Box::new(RoundRobin::default()),
            principal: Box::new(RoundRobin::default()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            teacher: Box::new(Seeded::new(seed)),
            principal: Box::new(Seeded::new(seed.wrapping_add(1))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemarkBand {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

pub fn remark_band(average: f64) -> RemarkBand {
    if average >= 70.0 {
        RemarkBand::Excellent
    } else if average >= 60.0 {
        RemarkBand::VeryGood
    } else if average >= 50.0 {
        RemarkBand::Good
    } else if average >= 40.0 {
        RemarkBand::Fair
    } else {
        RemarkBand::Poor
    }
}

fn teacher_pool(band: RemarkBand) -> &'static [&'static str] {
    match band {
        RemarkBand::Excellent => &[
            "An excellent result. Keep it up.",
            "Outstanding performance this term.",
            "A brilliant student who works with dedication.",
        ],
        RemarkBand::VeryGood => &[
            "A very good result. Aim higher next term.",
            "Very good effort shown in class work.",
            "Consistent and hardworking. Well done.",
        ],
        RemarkBand::Good => &[
            "A good result, but there is room for improvement.",
            "Fair performance. More effort is needed.",
            "Shows promise. Work harder on weak subjects.",
        ],
        RemarkBand::Fair => &[
            "An average result. Needs to be more serious with studies.",
            "Must put in more effort next term.",
            "Can do better with more concentration.",
        ],
        RemarkBand::Poor => &[
            "A poor result. Needs serious improvement.",
            "Should attend extra lessons and study harder.",
            "Must take studies more seriously next term.",
        ],
    }
}

fn principal_pool(band: RemarkBand) -> &'static [&'static str] {
    match band {
        RemarkBand::Excellent => &[
            "Excellent result. The school is proud of you.",
            "A commendable performance. Keep it up.",
        ],
        RemarkBand::VeryGood => &[
            "Very good result. Keep working hard.",
            "A pleasing performance. Strive for excellence.",
        ],
        RemarkBand::Good => &[
            "Good result. Put in more effort next term.",
            "Satisfactory. There is room for improvement.",
        ],
        RemarkBand::Fair => &[
            "Fair result. You can do much better.",
            "Needs to work harder next term.",
        ],
        RemarkBand::Poor => &[
            "Poor result. Parents should see the principal.",
            "Must improve greatly next term.",
        ],
    }
}

pub fn teacher_remark(average: f64, picker: &mut dyn RemarkPicker) -> String {
    picker.pick(teacher_pool(remark_band(average))).to_string()
}

pub fn principal_remark(average: f64, picker: &mut dyn RemarkPicker) -> String {
    picker.pick(principal_pool(remark_band(average))).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_average() {
        assert_eq!(remark_band(70.0), RemarkBand::Excellent);
        assert_eq!(remark_band(69.9), RemarkBand::VeryGood);
        assert_eq!(remark_band(50.0), RemarkBand::Good);
        assert_eq!(remark_band(40.0), RemarkBand::Fair);
        assert_eq!(remark_band(39.0), RemarkBand::Poor);
    }

    #[test]
    fn round_robin_cycles_pool() {
        let mut picker = RoundRobin::default();
        let pool = ["a", "b"];
        assert_eq!(picker.pick(&pool), "a");
        assert_eq!(picker.pick(&pool), "b");
        assert_eq!(picker.pick(&pool), "a");
        assert_eq!(picker.pick(&[]), "");
    }

    #[test]
    fn seeded_picker_is_reproducible() {
        let mut first = Seeded::new(7);
        let mut second = Seeded::new(7);
        for _ in 0..10 {
            assert_eq!(
                teacher_remark(85.0, &mut first),
                teacher_remark(85.0, &mut second)
            );
        }
    }

    #[test]
    fn remarks_come_from_matching_band() {
        let mut picker = Seeded::new(42);
        for _ in 0..10 {
            let remark = principal_remark(30.0, &mut picker);
            assert!(principal_pool(RemarkBand::Poor).iter().any(|r| *r == remark));
        }
        let mut picker = RoundRobin::default();
        let remark = teacher_remark(65.0, &mut picker);
        assert_eq!(remark, teacher_pool(RemarkBand::VeryGood)[0]);
    }

    #[test]
    fn each_pool_rotates_from_its_first_remark() {
        let mut pickers = RemarkPickers::round_robin();
        let teacher = teacher_remark(75.0, pickers.teacher.as_mut());
        let principal = principal_remark(75.0, pickers.principal.as_mut());
        assert_eq!(teacher, teacher_pool(RemarkBand::Excellent)[0]);
        assert_eq!(principal, principal_pool(RemarkBand::Excellent)[0]);

        let principal = principal_remark(75.0, pickers.principal.as_mut());
        assert_eq!(principal, principal_pool(RemarkBand::Excellent)[1]);
    }

    #[test]
    fn seeded_pickers_repeat_for_same_seed() {
        let mut first = RemarkPickers::seeded(3);
        let mut second = RemarkPickers::seeded(3);
        for _ in 0..5 {
            assert_eq!(
                principal_remark(45.0, first.principal.as_mut()),
                principal_remark(45.0, second.principal.as_mut())
            );
        }
    }
}
