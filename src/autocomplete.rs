use std::{cell::RefCell, collections::HashMap, rc::Rc};

use anyhow::Result;
use inquire::{autocompletion::Replacement, Autocomplete, CustomUserError};
use tracing::warn;

use crate::maps::{Bias, MapsService, Place};

/// Address suggestions from the places service, remembered so the chosen
/// one can be resolved to a location afterwards.
#[derive(Clone)]
pub struct PlaceAutocomplete<M> {
    maps: M,
    bias: Bias,
    seen: Rc<RefCell<HashMap<String, String>>>,
}

impl<M: MapsService> PlaceAutocomplete<M> {
    pub fn new(maps: M, bias: Bias) -> Self {
        Self {
            maps,
            bias,
            seen: Rc::default(),
        }
    }

    /// Looks up the place behind a suggestion. Text that never appeared as
    /// a suggestion has no location.
    pub fn resolve(&self, input: &str) -> Result<Place> {
        let place_id = self.seen.borrow().get(input).cloned();
        match place_id {
            Some(x) => self.maps.place_details(&x),
            None => Ok(Place::unresolved(input)),
        }
    }
}

impl<M: MapsService + Clone + 'static> Autocomplete for PlaceAutocomplete<M> {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        if input.trim().len() < 3 {
            return Ok(Vec::new());
        }
        let predictions = match self.maps.autocomplete(input, &self.bias) {
            Ok(x) => x,
            Err(err) => {
                warn!("Autocomplete failed: {err:#}");
                return Ok(Vec::new());
            }
        };

        let mut seen = self.seen.borrow_mut();
        Ok(predictions
            .into_iter()
            .map(|x| {
                seen.insert(x.description.clone(), x.place_id);
                x.description
            })
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}
