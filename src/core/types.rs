use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Elastic description of one side of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub elastic_modulus: f32,
    pub poisson_ratio: f32,
    /// Inverse radius of curvature at the contact, 0 for flat surfaces.
    pub curvature: f32,
    /// 0 for immovable obstacles.
    pub inverse_mass: f32,
}

impl Material {
    /// Flat immovable surface (plates, rigid side wall).
    pub fn obstacle(elastic_modulus: f32, poisson_ratio: f32) -> Self {
        Self {
            elastic_modulus,
            poisson_ratio,
            curvature: 0.0,
            inverse_mass: 0.0,
        }
    }

    /// Hertz effective modulus E*.
    pub fn effective_modulus(&self, other: &Material) -> f32 {
        let a = (1.0 - self.poisson_ratio * self.poisson_ratio) / self.elastic_modulus;
        let b = (1.0 - other.poisson_ratio * other.poisson_ratio) / other.elastic_modulus;
        1.0 / (a + b)
    }

    /// Effective radius R*, infinite when both surfaces are flat.
    pub fn effective_radius(&self, other: &Material) -> f32 {
        1.0 / (self.curvature + other.curvature)
    }

    /// Effective mass m*.
    pub fn effective_mass(&self, other: &Material) -> f32 {
        1.0 / (self.inverse_mass + other.inverse_mass)
    }
}

/// Static friction thresholds and spring constants shared by all pairs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticFriction {
    /// Tangential speed below which a contact may stick (m/s).
    pub speed: f32,
    /// Tangential spring length below which a contact may stick (m).
    pub length: f32,
    /// Spring stiffness per unit normal force (1/m).
    pub stiffness: f32,
    pub damping: f32,
}

/// Constant properties of the grain type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrainProperties {
    pub radius: f32,
    pub mass: f32,
    /// Solid sphere moment of inertia, 2/5·m·r².
    pub angular_mass: f32,
    pub material: Material,
}

impl GrainProperties {
    pub fn new(radius: f32, density: f32, elastic_modulus: f32, poisson_ratio: f32) -> Self {
        let volume = 4.0 / 3.0 * PI * radius.powi(3);
        let mass = density * volume;
        Self {
            radius,
            mass,
            angular_mass: 2.0 / 5.0 * mass * radius * radius,
            material: Material {
                elastic_modulus,
                poisson_ratio,
                curvature: 1.0 / radius,
                inverse_mass: 1.0 / mass,
            },
        }
    }
}

/// Constant properties of wire nodes and segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireProperties {
    pub radius: f32,
    pub internode_length: f32,
    /// Mass of one node (one segment of wire).
    pub mass: f32,
    pub tension_stiffness: f32,
    pub tension_damping: f32,
    pub bend_stiffness: f32,
    pub bend_damping: f32,
    pub material: Material,
}

impl WireProperties {
    pub fn new(radius: f32, internode_length: f32, density: f32, elastic_modulus: f32) -> Self {
        let section = PI * radius * radius;
        let mass = density * section * internode_length;
        let area_moment = PI / 4.0 * radius.powi(4);
        Self {
            radius,
            internode_length,
            mass,
            tension_stiffness: elastic_modulus * section,
            // mass per second
            tension_damping: mass,
            bend_stiffness: elastic_modulus * area_moment / internode_length,
            bend_damping: mass,
            material: Material {
                elastic_modulus,
                poisson_ratio: 0.0,
                curvature: 1.0 / radius,
                inverse_mass: 1.0 / mass,
            },
        }
    }
}

/// Geometry and constants of the cylindrical membrane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MembraneProperties {
    pub radius: f32,
    pub height: f32,
    pub internode_length: f32,
    /// Columns per row.
    pub width: usize,
    /// Number of rows, including the two rows bound to the plates.
    pub rows: usize,
    pub node_mass: f32,
    pub tension_stiffness: f32,
    pub tension_damping: f32,
    pub material: Material,
}

impl MembraneProperties {
    pub fn new(
        radius: f32,
        height: f32,
        internode_length: f32,
        thickness: f32,
        density: f32,
        elastic_modulus: f32,
        poisson_ratio: f32,
    ) -> Self {
        let width = ((2.0 * PI * radius / internode_length).round() as usize).max(3);
        let row_pitch = internode_length * 3f32.sqrt() / 2.0;
        let rows = ((height / row_pitch).round() as usize + 1).max(3);
        let node_area = internode_length * row_pitch;
        let node_mass = density * thickness * node_area;
        Self {
            radius,
            height,
            internode_length,
            width,
            rows,
            node_mass,
            tension_stiffness: elastic_modulus * thickness,
            tension_damping: node_mass,
            material: Material {
                elastic_modulus,
                poisson_ratio,
                curvature: 0.0,
                inverse_mass: 1.0 / node_mass,
            },
        }
    }

    /// Vertical distance between consecutive rows at rest.
    pub fn row_pitch(&self) -> f32 {
        self.height / (self.rows - 1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_has_no_curvature_or_inverse_mass() {
        let grain = GrainProperties::new(2.5e-3, 7.8e3, 1.97e11, 0.28);
        let wall = Material::obstacle(1.97e11, 0.28);
        assert!(grain.material.effective_radius(&wall) - 2.5e-3 < 1e-9);
        assert!((grain.material.effective_mass(&wall) - grain.mass).abs() < 1e-9);
    }

    #[test]
    fn effective_modulus_of_identical_materials_halves() {
        let grain = GrainProperties::new(2.5e-3, 7.8e3, 2e11, 0.0);
        let e = grain.material.effective_modulus(&grain.material);
        assert!((e - 1e11).abs() / 1e11 < 1e-5);
    }

    #[test]
    fn membrane_rows_cover_height() {
        let membrane = MembraneProperties::new(0.02, 0.04, 2.5e-3, 3e-4, 1e3, 1.5e6, 0.48);
        assert!(membrane.width >= 50);
        let top = membrane.row_pitch() * (membrane.rows - 1) as f32;
        assert!((top - 0.04).abs() < 1e-6);
    }
}
