//! Selection state machine: fly to a property, then show one detail callout.

use std::time::Duration;

use tracing::{debug, warn};

use crate::lod::MarkerKey;
use crate::model::{Property, PropertyId};
use crate::provider::ViewportProvider;
use crate::reconcile::MarkerTable;

#[derive(Debug)]
pub enum SelectionState<C> {
    Idle,
    Moving { target: Property },
    ShowingDetail { property: Property, callout: C },
}

impl<C> SelectionState<C> {
    pub fn is_idle(&self) -> bool {
        matches!(self, SelectionState::Idle)
    }

    pub fn is_moving(&self) -> bool {
        matches!(self, SelectionState::Moving { .. })
    }

    pub fn is_showing(&self) -> bool {
        matches!(self, SelectionState::ShowingDetail { .. })
    }
}

#[derive(Debug)]
pub struct SelectionController<C> {
    state: SelectionState<C>,
    select_zoom: f64,
    fly_duration: Duration,
}

impl<C> SelectionController<C> {
    pub fn new(select_zoom: f64, fly_duration: Duration) -> Self {
        Self { state: SelectionState::Idle, select_zoom, fly_duration }
    }

    pub fn state(&self) -> &SelectionState<C> {
        &self.state
    }

    /// Property being flown to or shown, if any.
    pub fn selected(&self) -> Option<&Property> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Moving { target } => Some(target),
            SelectionState::ShowingDetail { property, .. } => Some(property),
        }
    }

    pub fn selected_id(&self) -> Option<&PropertyId> {
        self.selected().map(|p| &p.id)
    }

    /// Close any open callout and start flying to `property`.
    ///
    /// Returns `false` when the property has no usable location; the
    /// controller is then left idle.
    pub fn select<P>(&mut self, property: Property, current_zoom: f64, provider: &mut P) -> bool
    where
        P: ViewportProvider<Callout = C>,
    {
        self.close(provider);

        let Some(target) = property.location() else {
            warn!(property = %property.id, "cannot select a property without a location");
            return false;
        };

        let zoom = if current_zoom.is_finite() { current_zoom.max(self.select_zoom) } else { self.select_zoom };
        provider.fly_to(target, zoom, self.fly_duration);
        debug!(property = %property.id, zoom, "flying to property");
        self.state = SelectionState::Moving { target: property };
        true
    }

    /// Camera arrived. Opens the callout if a flight is still wanted.
    pub fn move_complete<P>(&mut self, provider: &mut P, markers: &MarkerTable<P::Marker>)
    where
        P: ViewportProvider<Callout = C>,
    {
        let state = std::mem::replace(&mut self.state, SelectionState::Idle);
        self.state = match state {
            SelectionState::Moving { target } => {
                let anchor = markers.get(&MarkerKey::Property(target.id.clone()));
                let callout = provider.open_callout(&target, anchor);
                SelectionState::ShowingDetail { property: target, callout }
            }
            // arrival of a flight nobody is waiting for
            other => other,
        };
    }

    pub fn dismiss<P>(&mut self, provider: &mut P)
    where
        P: ViewportProvider<Callout = C>,
    {
        self.close(provider);
    }

    fn close<P>(&mut self, provider: &mut P)
    where
        P: ViewportProvider<Callout = C>,
    {
        if let SelectionState::ShowingDetail { callout, .. } =
            std::mem::replace(&mut self.state, SelectionState::Idle)
        {
            provider.close_callout(callout);
        }
    }
}
