use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// The four record kinds pulled from the wiki.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Kind {
    Character,
    Jutsu,
    Clan,
    Episode,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Character, Kind::Jutsu, Kind::Clan, Kind::Episode];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Character => "character",
            Kind::Jutsu => "jutsu",
            Kind::Clan => "clan",
            Kind::Episode => "episode",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown kind: {s}"))
    }
}

impl ToSql for Kind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Kind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub jutsu: Vec<String>,
    pub summary: String,
    pub images: Vec<String>,
    #[serde(rename = "personalInfo")]
    pub personal_info: PersonalInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub birthdate: String,
    pub sex: String,
    pub age: Vec<String>,
    pub height: Vec<String>,
    pub weight: Vec<String>,
    pub affiliation: Vec<String>,
    pub status: String,
    pub clan: Vec<String>,
    pub team: Vec<String>,
    #[serde(rename = "kekkei genkai")]
    pub kekkei_genkai: Vec<String>,
    #[serde(rename = "ninja rank")]
    pub ninja_rank: Vec<String>,
    #[serde(rename = "nature type")]
    pub nature_type: Vec<String>,
    pub classification: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jutsu {
    pub name: String,
    pub rank: String,
    pub nature: Vec<String>,
    pub classification: Vec<String>,
    pub handsigns: String,
    #[serde(rename = "derivedJutsu")]
    pub derived_jutsu: Vec<String>,
    #[serde(rename = "parentJutsu")]
    pub parent_jutsu: Vec<String>,
    pub users: Vec<String>,
    #[serde(rename = "relatedJutsu")]
    pub related_jutsu: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clan {
    pub name: String,
    pub summary: String,
    pub images: Vec<String>,
    pub affiliation: Vec<String>,
    #[serde(rename = "kekkei genkai")]
    pub kekkei_genkai: Vec<String>,
    pub classification: Vec<String>,
    pub jutsu: Vec<String>,
    pub tools: Vec<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    pub number: String,
    pub synopsis: String,
    pub trivia: Vec<String>,
    #[serde(rename = "BehindTheScenes")]
    pub behind_the_scenes: String,
    pub arc: String,
    #[serde(rename = "JapaneseAirDate")]
    pub japanese_air_date: String,
    #[serde(rename = "EnglishAirDate")]
    pub english_air_date: String,
}

/// An assembled record ready for the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Character(Character),
    Jutsu(Jutsu),
    Clan(Clan),
    Episode(Episode),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Record::Character(_) => Kind::Character,
            Record::Jutsu(_) => Kind::Jutsu,
            Record::Clan(_) => Kind::Clan,
            Record::Episode(_) => Kind::Episode,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Record::Character(c) => &c.name,
            Record::Jutsu(j) => &j.name,
            Record::Clan(c) => &c.name,
            Record::Episode(e) => &e.name,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Record::Character(c) => serde_json::to_string(c),
            Record::Jutsu(j) => serde_json::to_string(j),
            Record::Clan(c) => serde_json::to_string(c),
            Record::Episode(e) => serde_json::to_string(e),
        }
    }
}
