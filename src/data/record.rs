use std::fmt;

/// Number of selectable grade levels
pub const GRADE_COUNT: usize = 8;

/// School grade level, always within 1..=8
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Grade(u8);

impl Grade {
    pub const FIRST: Grade = Grade(1);
    pub const LAST: Grade = Grade(GRADE_COUNT as u8);

    pub fn new(level: u8) -> Option<Self> {
        (1..=GRADE_COUNT as u8).contains(&level).then_some(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Zero-based position in a per-grade series
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Next grade, saturating at the last one
    pub fn next(self) -> Self {
        Self((self.0 + 1).min(Self::LAST.0))
    }

    /// Previous grade, saturating at the first one
    pub fn prev(self) -> Self {
        Self((self.0 - 1).max(Self::FIRST.0))
    }

    pub fn all() -> impl Iterator<Item = Grade> + Clone {
        (1..=GRADE_COUNT as u8).map(Grade)
    }
}

impl TryFrom<u8> for Grade {
    type Error = u8;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Grade::new(level).ok_or(level)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two enrollment sub-populations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Population {
    Girls,
    Boys,
}

impl Population {
    /// Draw order: girls underneath, boys on top
    pub const ALL: [Population; 2] = [Population::Girls, Population::Boys];

    /// Column prefix in the dataset (`G3`, `B3`)
    pub fn prefix(self) -> char {
        match self {
            Population::Girls => 'G',
            Population::Boys => 'B',
        }
    }

    pub fn column(self, grade: Grade) -> String {
        format!("{}{}", self.prefix(), grade)
    }

    pub fn label(self) -> &'static str {
        match self {
            Population::Girls => "Girls",
            Population::Boys => "Boys",
        }
    }
}

/// Per-county enrollment counts at one geographic point
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolRecord {
    pub county: String,
    pub lon: f64,
    pub lat: f64,
    girls: [Option<u32>; GRADE_COUNT],
    boys: [Option<u32>; GRADE_COUNT],
}

impl SchoolRecord {
    pub fn new(
        county: impl Into<String>,
        lon: f64,
        lat: f64,
        girls: [Option<u32>; GRADE_COUNT],
        boys: [Option<u32>; GRADE_COUNT],
    ) -> Self {
        Self {
            county: county.into(),
            lon,
            lat,
            girls,
            boys,
        }
    }

    fn counts(&self, population: Population) -> &[Option<u32>; GRADE_COUNT] {
        match population {
            Population::Girls => &self.girls,
            Population::Boys => &self.boys,
        }
    }

    /// Count for one population and grade, `None` when absent in the source
    pub fn value(&self, population: Population, grade: Grade) -> Option<u32> {
        self.counts(population)[grade.index()]
    }

    /// All eight grades as chart values; absent counts become 0
    pub fn series(&self, population: Population) -> [f64; GRADE_COUNT] {
        self.counts(population).map(|v| v.map_or(0.0, f64::from))
    }
}

/// Coerce a raw cell into a count.
///
/// Empty, non-numeric, negative and non-finite cells are absent.
pub fn coerce_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().and_then(coerce_number)
}

pub fn coerce_number(value: f64) -> Option<u32> {
    (value.is_finite() && value >= 0.0 && value <= u32::MAX as f64).then(|| value.round() as u32)
}
