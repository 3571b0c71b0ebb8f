use super::{simple_context, Context, UserContext};
use crate::client::Evogram;
use crate::types::{Contact, Location, Venue};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub struct LocationContext {
    client: Evogram,
    source: Location,
}

simple_context!(LocationContext, Location);

impl LocationContext {
    pub fn latitude(&self) -> f64 {
        self.source.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.source.longitude
    }

    /// Radius of uncertainty in meters.
    pub fn horizontal_accuracy(&self) -> Option<f64> {
        self.source.horizontal_accuracy
    }

    /// Seconds during which a live location keeps updating.
    pub fn live_period(&self) -> Option<u32> {
        self.source.live_period
    }

    /// Direction of movement in degrees, 1..=360.
    pub fn heading(&self) -> Option<u16> {
        self.source.heading
    }

    pub fn proximity_alert_radius(&self) -> Option<u32> {
        self.source.proximity_alert_radius
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_to(&self, other: &Location) -> f64 {
        let (lat1, lat2) = (
            self.source.latitude.to_radians(),
            other.latitude.to_radians(),
        );
        let d_lat = (other.latitude - self.source.latitude).to_radians();
        let d_lon = (other.longitude - self.source.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Initial bearing towards `other` in degrees clockwise from north, in `[0, 360)`.
    pub fn bearing_to(&self, other: &Location) -> f64 {
        let (lat1, lat2) = (
            self.source.latitude.to_radians(),
            other.latitude.to_radians(),
        );
        let d_lon = (other.longitude - self.source.longitude).to_radians();

        let east = d_lon.sin() * lat2.cos();
        let north = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        (east.atan2(north).to_degrees() + 360.0) % 360.0
    }

    pub fn is_within_radius(&self, center: &Location, radius_m: f64) -> bool {
        self.distance_to(center) <= radius_m
    }

    pub fn google_maps_link(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.source.latitude, self.source.longitude
        )
    }

    pub fn is_live(&self) -> bool {
        self.source.live_period.is_some_and(|period| period > 0)
    }

    /// Whether the reported accuracy is known and no worse than `max_accuracy_m`.
    pub fn is_accurate(&self, max_accuracy_m: f64) -> bool {
        self.source
            .horizontal_accuracy
            .is_some_and(|accuracy| accuracy <= max_accuracy_m)
    }
}

pub struct VenueContext {
    client: Evogram,
    source: Venue,
}

simple_context!(VenueContext, Venue);

impl VenueContext {
    pub fn location(&self) -> LocationContext {
        LocationContext::new(self.client.clone(), self.source.location)
    }

    pub fn title(&self) -> &str {
        &self.source.title
    }

    pub fn address(&self) -> &str {
        &self.source.address
    }

    /// Foursquare id and type.
    pub fn foursquare(&self) -> (Option<&str>, Option<&str>) {
        (
            self.source.foursquare_id.as_deref(),
            self.source.foursquare_type.as_deref(),
        )
    }

    /// Google Places id and type.
    pub fn google_place(&self) -> (Option<&str>, Option<&str>) {
        (
            self.source.google_place_id.as_deref(),
            self.source.google_place_type.as_deref(),
        )
    }
}

pub struct ContactContext {
    client: Evogram,
    source: Contact,
}

simple_context!(ContactContext, Contact);

impl ContactContext {
    pub fn phone_number(&self) -> &str {
        &self.source.phone_number
    }

    pub fn first_name(&self) -> &str {
        &self.source.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.source.last_name.as_deref()
    }

    pub fn full_name(&self) -> String {
        match &self.source.last_name {
            Some(last_name) => format!("{} {}", self.source.first_name, last_name)
                .trim_end()
                .to_string(),
            None => self.source.first_name.clone(),
        }
    }

    /// Telegram id of the contact, when it is a Telegram user.
    pub fn user_id(&self) -> Option<i64> {
        self.source.user_id
    }

    /// Raw vCard text; not parsed.
    pub fn vcard(&self) -> Option<&str> {
        self.source.vcard.as_deref()
    }

    /// Wrapper for the contact's Telegram account when `user_id` is set.
    /// Only the id and first name are known.
    pub fn user(&self) -> Option<UserContext> {
        let id = self.source.user_id?;
        let user = serde_json::from_value(serde_json::json!({
            "id": id,
            "is_bot": false,
            "first_name": self.source.first_name,
            "last_name": self.source.last_name,
        }))
        .ok()?;
        Some(UserContext::new(self.client.clone(), user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> Evogram {
        Evogram::builder("TEST_TOKEN")
            .api_url("http://127.0.0.1:9")
            .build()
    }

    fn at(latitude: f64, longitude: f64) -> LocationContext {
        LocationContext::new(client(), Location::new(latitude, longitude))
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let distance = at(0.0, 0.0).distance_to(&Location::new(1.0, 0.0));
        assert!((distance - 111_195.0).abs() < 1.0, "{}", distance);
        assert_eq!(at(10.0, 10.0).distance_to(&Location::new(10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = at(0.0, 0.0);
        assert!(origin.bearing_to(&Location::new(1.0, 0.0)).abs() < 1e-9);
        assert!((origin.bearing_to(&Location::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((origin.bearing_to(&Location::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((origin.bearing_to(&Location::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_radius_and_predicates() {
        let berlin = at(52.52, 13.405);
        assert!(berlin.is_within_radius(&Location::new(52.53, 13.41), 2_000.0));
        assert!(!berlin.is_within_radius(&Location::new(48.8566, 2.3522), 100_000.0));
        assert!(!berlin.is_live());
        assert!(!berlin.is_accurate(50.0));
        assert_eq!(
            berlin.google_maps_link(),
            "https://www.google.com/maps?q=52.52,13.405"
        );
    }

    #[test]
    fn test_live_accurate_location() {
        let location = LocationContext::from_value(
            client(),
            json!({
                "latitude": 1.0,
                "longitude": 2.0,
                "horizontal_accuracy": 20.0,
                "live_period": 600
            }),
        )
        .unwrap();
        assert!(location.is_live());
        assert!(location.is_accurate(50.0));
        assert!(!location.is_accurate(10.0));
    }

    #[test]
    fn test_contact_user_needs_user_id() {
        let contact = ContactContext::from_value(
            client(),
            json!({ "phone_number": "+100", "first_name": "Ada", "last_name": "Lovelace" }),
        )
        .unwrap();
        assert!(contact.user().is_none());
        assert_eq!(contact.full_name(), "Ada Lovelace");

        let contact = ContactContext::from_value(
            client(),
            json!({ "phone_number": "+100", "first_name": "Ada", "user_id": 5 }),
        )
        .unwrap();
        assert_eq!(contact.user().unwrap().id(), 5);
    }
}
