pub mod camera;
pub mod canvas;
pub mod frustum;
pub mod hit;
pub mod ray;

pub use camera::PerspectiveCamera;
pub use canvas::CanvasBounds;
pub use frustum::Frustum;
pub use hit::{Hit, nearest_eligible, pick_at, pick_in_frustum, pick_in_rect};
pub use ray::{Plane, Ray};
