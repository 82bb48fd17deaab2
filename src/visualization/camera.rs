//! Simple perspective projector with drag rotation and inertia
//!
//! Points are rotated about Y (yaw) first, then about X (pitch), then
//! divided by depth: `scale = perspective / (perspective + z)`. The order is
//! fixed; swapping it changes how orbits look.
//!
//! Points with `scale <= 0` are behind the camera, and points on the focal
//! plane (`perspective + z == 0`) get an infinite scale. `project` still
//! returns both; callers cull with [`Projection::is_visible`].

/// Angular speeds below this are snapped to zero when coasting
const REST_EPSILON: f64 = 1e-5;

/// Screen-space result of projecting a world point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub x: f64,     // screen offset from the view center
    pub y: f64,
    pub z: f64,     // rotated depth, larger is further away
    pub scale: f64, // perspective size multiplier
}

impl Projection {
    /// In front of the camera and not on its focal plane
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.scale > 0.0 && self.scale.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera3D {
    pub perspective: f64, // focal length in world units
    pub rotation_x: f64,  // pitch, radians
    pub rotation_y: f64,  // yaw, radians
    pub inertia: bool,
    pub friction: f64,    // per-update decay of angular velocity
    pub sensitivity: f64, // radians per pixel of drag
    pub auto_rotate: f64, // constant yaw speed, rad/s
    angular_x: f64,       // coasting angular velocity, rad/s
    angular_y: f64,
    dragging: bool,
}

impl Camera3D {
    pub fn new(perspective: f64) -> Self {
        Self {
            perspective,
            rotation_x: 0.0,
            rotation_y: 0.0,
            inertia: true,
            friction: 0.95,
            sensitivity: 0.005,
            auto_rotate: 0.0,
            angular_x: 0.0,
            angular_y: 0.0,
            dragging: false,
        }
    }

    pub fn with_rotation(mut self, rotation_x: f64, rotation_y: f64) -> Self {
        self.rotation_x = rotation_x;
        self.rotation_y = rotation_y;
        self
    }

    pub fn with_inertia(mut self, inertia: bool, friction: f64) -> Self {
        self.inertia = inertia;
        self.friction = friction;
        self
    }

    pub fn with_auto_rotate(mut self, speed: f64) -> Self {
        self.auto_rotate = speed;
        self
    }

    /// Rotate `(x, y, z)` by the current orientation and apply perspective
    pub fn project(&self, x: f64, y: f64, z: f64) -> Projection {
        let (sin_y, cos_y) = self.rotation_y.sin_cos();
        let (sin_x, cos_x) = self.rotation_x.sin_cos();

        // yaw about Y
        let x1 = x * cos_y + z * sin_y;
        let z1 = z * cos_y - x * sin_y;

        // pitch about X
        let y2 = y * cos_x - z1 * sin_x;
        let z2 = z1 * cos_x + y * sin_x;

        let scale = self.perspective / (self.perspective + z2);
        Projection {
            x: x1 * scale,
            y: y2 * scale,
            z: z2,
            scale,
        }
    }

    // drag =================================================================================

    pub fn begin_drag(&mut self) {
        self.dragging = true;
        self.angular_x = 0.0;
        self.angular_y = 0.0;
    }

    /// Rotate by a pointer delta in pixels over `dt` seconds
    ///
    /// Horizontal motion yaws, vertical motion pitches. The delta rate is kept
    /// as the coasting velocity for when the drag ends.
    pub fn drag(&mut self, dx: f64, dy: f64, dt: f64) {
        let ry = dx * self.sensitivity;
        let rx = dy * self.sensitivity;
        self.rotation_y += ry;
        self.rotation_x += rx;
        if dt > 0.0 {
            self.angular_y = ry / dt;
            self.angular_x = rx / dt;
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
        if !self.inertia {
            self.angular_x = 0.0;
            self.angular_y = 0.0;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn angular_velocity(&self) -> (f64, f64) {
        (self.angular_x, self.angular_y)
    }

    /// Coast after a drag (`w *= friction` per call) and apply auto-rotation
    pub fn update(&mut self, dt: f64) {
        self.rotation_y += self.auto_rotate * dt;

        if self.dragging || !self.inertia {
            return;
        }

        self.rotation_x += self.angular_x * dt;
        self.rotation_y += self.angular_y * dt;
        self.angular_x *= self.friction;
        self.angular_y *= self.friction;

        if self.angular_x.abs() < REST_EPSILON {
            self.angular_x = 0.0;
        }
        if self.angular_y.abs() < REST_EPSILON {
            self.angular_y = 0.0;
        }
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::new(800.0)
    }
}
