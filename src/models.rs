use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::entities::{movie, movie_image, person};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Rating {
    #[default]
    #[serde(rename = "NR")]
    NotRated,
    G,
    PG,
    R,
}

impl Rating {
    pub fn as_code(self) -> i32 {
        match self {
            Rating::NotRated => 0,
            Rating::G => 1,
            Rating::PG => 2,
            Rating::R => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Rating::NotRated),
            1 => Some(Rating::G),
            2 => Some(Rating::PG),
            3 => Some(Rating::R),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::NotRated => "NR - Not Rated",
            Rating::G => "G - General Audiences",
            Rating::PG => "PG - Parental Guidance Suggested",
            Rating::R => "R - Restricted",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_value(self) -> i16 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }

    pub fn from_value(value: i16) -> Option<Self> {
        match value {
            1 => Some(VoteValue::Up),
            -1 => Some(VoteValue::Down),
            _ => None,
        }
    }

    /// Parses the vote form field: `1`/`-1`, or `up`/`down`.
    pub fn parse_form(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(VoteValue::Up),
            "down" => Some(VoteValue::Down),
            other => other.parse().ok().and_then(Self::from_value),
        }
    }
}

/// Fields of a movie as entered; the slug is derived on save.
#[derive(Clone, Debug)]
pub struct MovieInput {
    pub title: String,
    pub plot: String,
    pub year: i32,
    pub rating: Rating,
    pub runtime: i32,
    pub website: Option<String>,
    pub director_id: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct PersonInput {
    pub first_name: String,
    pub last_name: String,
    pub born: jiff::civil::Date,
    pub died: Option<jiff::civil::Date>,
}

#[derive(Clone, Debug)]
pub struct ActorCredit {
    pub person: person::Model,
    pub role: String,
}

#[derive(Clone, Debug)]
pub struct MovieDetail {
    pub movie: movie::Model,
    pub rating: Rating,
    pub director: Option<person::Model>,
    pub writers: Vec<person::Model>,
    pub actors: Vec<ActorCredit>,
    pub images: Vec<movie_image::Model>,
    pub score: i64,
}

#[derive(Clone, Debug)]
pub struct RoleCredit {
    pub movie: movie::Model,
    pub role: String,
}

#[derive(Clone, Debug)]
pub struct PersonDetail {
    pub person: person::Model,
    pub directed: Vec<movie::Model>,
    pub written: Vec<movie::Model>,
    pub roles: Vec<RoleCredit>,
}

/// A requested list page: a 1-based number or the final page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageNumber {
    Number(u64),
    Last,
}

impl PageNumber {
    /// Reads the `page` query value; a missing or blank value is page 1.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => Some(Self::Number(1)),
            Some("last") => Some(Self::Last),
            Some(raw) => raw.parse().ok().map(Self::Number),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MoviePage {
    pub movies: Vec<movie::Model>,
    pub number: u64,
    pub num_pages: u64,
}

impl MoviePage {
    pub fn is_first(&self) -> bool {
        self.number == 1
    }

    pub fn is_last(&self) -> bool {
        self.number == self.num_pages
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct TopMovie {
    pub id: i32,
    pub title: String,
    pub year: i32,
    pub score: i64,
}

/// The viewer's vote on a movie, saved or not yet saved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewerVote {
    pub id: Option<i32>,
    pub movie_id: i32,
    pub user_id: i32,
    pub value: Option<VoteValue>,
}

impl ViewerVote {
    /// Where the vote form posts: update for a saved vote, create otherwise.
    pub fn form_action(&self) -> String {
        match self.id {
            Some(id) => format!("/movie/{}/vote/{}/", self.movie_id, id),
            None => format!("/movie/{}/vote/", self.movie_id),
        }
    }
}
