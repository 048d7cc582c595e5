use nalgebra::Point3;

/// Read-only access to the vertex coordinates of a surface.
///
/// Implementations are shared across sampling threads, so they must be `Sync`.
pub trait SurfaceCoordinates: Sync {
    fn node_count(&self) -> usize;

    /// World coordinate of `node`; `node < node_count()`.
    fn coordinate(&self, node: usize) -> Point3<f64>;
}

/// Triangulated surface mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub coordinates: Vec<Point3<f64>>,
    pub triangles: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    pub fn new(coordinates: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            coordinates,
            triangles,
        }
    }
}

impl SurfaceCoordinates for SurfaceMesh {
    fn node_count(&self) -> usize {
        self.coordinates.len()
    }

    fn coordinate(&self, node: usize) -> Point3<f64> {
        self.coordinates[node]
    }
}

impl SurfaceCoordinates for [Point3<f64>] {
    fn node_count(&self) -> usize {
        self.len()
    }

    fn coordinate(&self, node: usize) -> Point3<f64> {
        self[node]
    }
}
