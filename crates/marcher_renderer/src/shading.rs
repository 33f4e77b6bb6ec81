//! Shading: direct lighting, reflections, ambient occlusion and the
//! per-pixel post effects.

use marcher_core::{LightingOptions, Scene};
use marcher_math::{angle_between, direction_between, reflect, vec3_to_rgba, Color, Ray, Vec2, Vec3};

use crate::camera::Camera;
use crate::march::{march, surface_normal, MarchResult, MarchTargets};

/// Render one pixel: march the camera ray, shade it and post-process.
pub fn shade_pixel(scene: &Scene, camera: &Camera, x: u32, y: u32) -> Color {
    let options = scene.options();
    let ray = camera.ray_for_pixel(x, y);
    let result = march(&ray, scene, MarchTargets::Drawables);

    let color = shade(&result, scene, 0);
    let color = post_process(
        color,
        &result,
        options,
        camera.center_offset(x, y),
        camera.diagonal(),
    );
    vec3_to_rgba(color, options.background_color.a)
}

/// Color of a march result before post-processing, as a `[0, 1]` vector.
///
/// `depth` counts reflection bounces; the primary ray is depth 0.
pub fn shade(result: &MarchResult, scene: &Scene, depth: u32) -> Vec3 {
    let options = scene.options();
    let Some(primitive) = result.hit.as_ref() else {
        return options.background_color.to_vec3();
    };

    let normal = surface_normal(primitive, result.position, result.hit_threshold);
    let base = primitive.color_vec();
    let material = primitive.reflection();

    // Ambient is never shadow tested.
    let mut color = base * material.ambient;

    for light in scene.lights() {
        let to_light = direction_between(result.position, light.position());
        if angle_between(to_light, normal) >= 90.0 {
            continue;
        }

        if options.shadows_enabled {
            let shadow_ray = Ray::new(result.position, to_light);
            let shadow = march(&shadow_ray, scene, MarchTargets::DrawablesAndLights);
            match shadow.hit {
                Some(reached) if reached.same_surface(light) => {}
                _ => continue,
            }
        }

        let light_color = light.color_vec() * light.color().brightness();

        let diffuse = to_light.dot(normal).max(0.0) * material.lambertian;
        color += base * light_color * diffuse;

        if material.specular > 0.0 {
            let mirrored = reflect(-to_light, normal);
            let highlight = mirrored.dot(-result.direction).max(0.0).powf(material.smoothness);
            let tint = light_color.lerp(base, material.metalness.clamp(0.0, 1.0));
            color += tint * highlight * material.specular;
        }
    }

    let mut color = color.clamp(Vec3::ZERO, Vec3::ONE);

    let reflectivity = material.reflectivity.min(1.0);
    if options.reflections_enabled && depth < options.max_reflection_depth && reflectivity > 0.0 {
        let bounce_ray = Ray::new(result.position, reflect(result.direction, normal));
        let bounce = march(&bounce_ray, scene, MarchTargets::Drawables);
        if bounce.is_hit() {
            let reflected = shade(&bounce, scene, depth + 1);
            color = color * (1.0 - reflectivity) + reflected * reflectivity;
        }
    }

    if options.ambient_occlusion.enabled {
        color *= occlusion_factor(result.steps, options);
    }

    color
}

/// Step-count occlusion scale for a hit.
fn occlusion_factor(steps: u32, options: &LightingOptions) -> f64 {
    let ao = &options.ambient_occlusion;
    let occluded = (f64::from(steps) / (ao.max_steps - 1.0).max(1.0)).min(0.95);
    if ao.inverted {
        occluded
    } else {
        1.0 - occluded
    }
}

/// Apply distance dropoff and then vignette to a shaded color.
///
/// `offset` is the pixel's offset from the image center and `diagonal` the
/// image diagonal, both in pixels.
pub fn post_process(
    color: Vec3,
    result: &MarchResult,
    options: &LightingOptions,
    offset: Vec2,
    diagonal: f64,
) -> Vec3 {
    let mut color = color;

    if options.dropoff.enabled {
        let dropoff_distance = options.dropoff.distance.min(options.trace.max_trace_distance);
        let fraction = if dropoff_distance > 0.0 {
            (result.distance_traveled / dropoff_distance).min(1.0)
        } else {
            1.0
        };
        let keep = 1.0 - fraction * fraction;
        color = color * keep + options.dropoff.color.to_vec3() * (1.0 - keep);
    }

    if options.vignette.enabled {
        let strength = options.vignette.strength.min(1.0);
        let max_norm = diagonal * (1.0 - strength).min(1.0);
        if max_norm > 0.0 {
            color *= (1.0 - offset.length() / max_norm).max(0.0);
        } else {
            color = Vec3::ZERO;
        }
    }

    color
}
