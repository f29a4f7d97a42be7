// dronewatch-simulator/src/lib.rs

/*!
# Dronewatch Simulator

Synthetic detection sources for the dashboard.

## Key Components:
- **Detection Generator:** seedable random producer payloads over known OUIs
  and sensor locations, driven by the engine's simulation feed.
- **Local Dataset:** an in-process `Backend` with plausible detections, used
  whenever the real backend cannot be reached.
*/

pub mod dataset;
pub mod generator;

pub use dataset::LocalDataset;
pub use generator::{DetectionGenerator, KNOWN_OUIS, SENSOR_LOCATIONS};
