// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// benchmark works with: detections, regions, result rows, test
// set roles, and the collaborator traits.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Boxes, raw detections, aggregated regions
pub mod detection;

// Result rows and their summary
pub mod result;

// Named roles of the benchmarked image sets
pub mod test_set;

// Collaborator abstractions that other layers implement
pub mod traits;
