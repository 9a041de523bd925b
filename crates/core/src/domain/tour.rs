use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TourId(pub u32);

impl std::fmt::Display for TourId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: TourId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub image: String,
    /// Whole currency units per guest.
    pub price: i64,
    /// Length in days.
    pub duration: u32,
    /// Doubles as the country when matching chat preferences.
    pub location: String,
    pub category: String,
    pub max_group_size: u32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
}

impl Tour {
    pub fn offers_date(&self, date: &str) -> bool {
        self.dates.iter().any(|candidate| candidate == date)
    }

    pub fn total_price(&self, guests: u32) -> i64 {
        self.price * i64::from(guests)
    }

    pub fn is_challenging(&self) -> bool {
        self.difficulty.eq_ignore_ascii_case("challenging")
    }
}
