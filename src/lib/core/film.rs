use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name of the page section holding the film list.
pub const FILMS_SECTION: &str = "films";

/// Page sections keyed by the name the page template iterates over.
pub type FilmSections = HashMap<String, Vec<Film>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub title: String,
    pub director: String,
}

impl Film {
    pub fn new(title: impl Into<String>, director: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            director: director.into(),
        }
    }

    /// The films shown on the index page before anything is added.
    pub fn catalog() -> Vec<Film> {
        vec![
            Film::new("The Godfather", "Francis Ford Coppola"),
            Film::new("Blade Runner", "Ridley Scott"),
            Film::new("The Thing", "John Carpenter"),
        ]
    }
}
