use crate::ffi::Engine;
use crate::math;
use crate::world::WorldType;

use super::SoftwareEngine;

/// Same tolerance the wrapped engine uses for its fuzzy zero test.
const FUZZY_ZERO: f32 = std::f32::EPSILON;

impl SoftwareEngine {
    pub(super) fn step(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> u32 {
        let (sub_steps, sub_step_size) = match self.world_type {
            WorldType::Simple => (1, time_step),
            _ if max_sub_steps > 0 => {
                self.local_time += time_step;
                let mut sub_steps = 0;
                if self.local_time >= fixed_time_step {
                    sub_steps = (self.local_time / fixed_time_step) as u32;
                    // the remainder is taken against the unclamped count
                    self.local_time -= sub_steps as f32 * fixed_time_step;
                }
                (sub_steps.min(max_sub_steps), fixed_time_step)
            }
            _ => {
                self.local_time = time_step;
                if time_step.abs() < FUZZY_ZERO {
                    (0, time_step)
                } else {
                    (1, time_step)
                }
            }
        };

        if sub_steps > 0 {
            self.apply_gravity();
            for _ in 0..sub_steps {
                self.single_step(sub_step_size);
            }
        }

        self.synchronize_motion_states();
        self.clear_forces();
        sub_steps
    }

    fn single_step(&mut self, time_step: f32) {
        let mut info = self.solver_info.get();
        info.time_step = time_step;
        self.solver_info.set(info);

        if let Some(hook) = self.pre_tick {
            unsafe { (hook.callback)(hook.user_info, time_step) };
        }

        self.integrate(time_step);

        // actions added while stepping aren't reachable from here (the world defers them),
        // so a snapshot of the array is enough
        let actions: Vec<_> = self
            .action_array
            .iter()
            .map(|raw| self.actions[raw.as_raw()])
            .collect();
        for action in actions {
            unsafe { (action.callback)(action.user_data, time_step) };
        }

        if let Some(hook) = self.post_tick {
            unsafe { (hook.callback)(hook.user_info, time_step) };
        }
    }

    fn apply_gravity(&mut self) {
        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut() {
            if body.filter.is_some() && body.inv_mass > 0.0 {
                let weight = math::scale(gravity, 1.0 / body.inv_mass);
                body.total_force = math::add(body.total_force, weight);
            }
        }
    }

    fn integrate(&mut self, time_step: f32) {
        for (_, body) in self.bodies.iter_mut() {
            if body.filter.is_none() || body.inv_mass == 0.0 {
                continue;
            }
            let acceleration = math::scale(body.total_force, body.inv_mass);
            body.linear_velocity = math::add(body.linear_velocity, math::scale(acceleration, time_step));
            body.position = math::add(body.position, math::scale(body.linear_velocity, time_step));
        }
    }
}
