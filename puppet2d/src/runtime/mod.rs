mod animation;
mod constraint;
mod player;
mod skeleton;

pub use player::*;
pub use skeleton::*;


#[cfg(test)]
mod animation_tests;



#[cfg(test)]
mod player_tests;
