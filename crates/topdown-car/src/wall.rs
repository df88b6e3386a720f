//! Static obstacles.

use crate::{
    error::Result,
    spec::WallSpec,
    world::{BodyDesc, BodyHandle, BoxFixture, RigidBodyWorld},
};

/// A static box. Built once, never updated.
#[derive(Clone, Copy, Debug)]
pub struct Wall {
    body: BodyHandle,
}

impl Wall {
    pub fn new(spec: &WallSpec, world: &mut impl RigidBodyWorld) -> Result<Self> {
        let placement = &spec.placement;
        let body = world.create_body(&BodyDesc::fixed(placement.position, placement.angle));
        world.attach_box(
            body,
            &BoxFixture::new(placement.width / 2.0, placement.height / 2.0),
        )?;
        Ok(Self { body })
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
}
